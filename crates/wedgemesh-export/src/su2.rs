//! SU2 solver configuration sweeps.
//!
//! A sweep takes one template `.cfg` and produces one configuration per
//! flow condition by exact key substitution. Substituted entries:
//!
//! | Key | Value |
//! |---|---|
//! | `MACH_NUMBER` | freestream Mach |
//! | `FREESTREAM_TEMPERATURE` | static temperature (K) |
//! | `FREESTREAM_PRESSURE` | static pressure (Pa) |
//! | `MARKER_SUPERSONIC_INLET` | first three numbers after `Inlet`: T, P, u |
//! | `MESH_FILENAME` | mesh file name |
//! | `MESH_FORMAT` | upper-case mesh extension |
//!
//! Only assignments at the start of a line are touched, so commented
//! (`%`) entries and keys that merely end in a substituted name keep
//! their text.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;

#[allow(clippy::expect_used)]
static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?P<lhs>[ \t]*(?P<key>[A-Za-z_][A-Za-z0-9_]*)[ \t]*=[ \t]*)(?P<value>\S+)")
        .expect("assignment pattern is a valid regex")
});

#[allow(clippy::expect_used)]
static SUPERSONIC_INLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(?P<lhs>[ \t]*MARKER_SUPERSONIC_INLET[ \t]*=[ \t]*\([ \t]*Inlet[ \t]*,[ \t]*)[\d.Ee+-]+,[ \t]*[\d.Ee+-]+,[ \t]*[\d.Ee+-]+",
    )
    .expect("inlet marker pattern is a valid regex")
});

/// Ideal-gas constants used to derive the inlet velocity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasProperties {
    /// Ratio of specific heats.
    pub gamma: f64,

    /// Specific gas constant in J/(kg K).
    pub gas_constant: f64,
}

impl GasProperties {
    /// Dry air.
    pub const AIR: Self = Self {
        gamma: 1.4,
        gas_constant: 287.058,
    };

    /// Speed of sound at `temperature` kelvin.
    #[must_use]
    pub fn speed_of_sound(&self, temperature: f64) -> f64 {
        (self.gamma * self.gas_constant * temperature).sqrt()
    }
}

impl Default for GasProperties {
    fn default() -> Self {
        Self::AIR
    }
}

/// One freestream condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepCase {
    /// Mach number.
    pub mach: f64,
    /// Static temperature in kelvin.
    pub temperature: f64,
    /// Static pressure in pascals.
    pub pressure: f64,
}

impl SweepCase {
    /// Create a case.
    #[must_use]
    pub const fn new(mach: f64, temperature: f64, pressure: f64) -> Self {
        Self {
            mach,
            temperature,
            pressure,
        }
    }

    /// Every combination of the given values, Mach varying slowest.
    #[must_use]
    pub fn grid(machs: &[f64], temperatures: &[f64], pressures: &[f64]) -> Vec<Self> {
        let mut cases = Vec::with_capacity(machs.len() * temperatures.len() * pressures.len());
        for &mach in machs {
            for &temperature in temperatures {
                for &pressure in pressures {
                    cases.push(Self::new(mach, temperature, pressure));
                }
            }
        }
        cases
    }

    /// Axial inlet velocity `mach * sqrt(gamma * R * T)`.
    #[must_use]
    pub fn velocity(&self, gas: &GasProperties) -> f64 {
        self.mach * gas.speed_of_sound(self.temperature)
    }

    /// Directory name for this case run on `mesh_stem`.
    ///
    /// `<stem>_M<mach>_T<temperature>_P<pressure>` with three decimals
    /// of Mach, one of temperature and integral pressure; every `.`
    /// becomes `p` so the name is a single path component without
    /// extension-like suffixes.
    #[must_use]
    pub fn case_name(&self, mesh_stem: &str) -> String {
        format!(
            "{mesh_stem}_M{:.3}_T{:.1}_P{:.0}",
            self.mach, self.temperature, self.pressure
        )
        .replace('.', "p")
    }
}

/// Format a number the way the solver configs write them: always with
/// a decimal point.
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Replace the value of every `key = ...` line.
///
/// # Errors
///
/// Returns [`ExportError::MissingTemplateKey`] if no line assigns `key`.
pub fn replace_value(text: &str, key: &str, value: &str) -> Result<String, ExportError> {
    let mut found = false;
    let replaced = ASSIGNMENT.replace_all(text, |caps: &Captures<'_>| {
        if &caps["key"] == key {
            found = true;
            format!("{}{value}", &caps["lhs"])
        } else {
            caps[0].to_string()
        }
    });
    if !found {
        return Err(ExportError::MissingTemplateKey {
            key: key.to_string(),
        });
    }
    Ok(replaced.into_owned())
}

/// Replace the temperature, pressure and velocity of the supersonic
/// inlet marker.
///
/// # Errors
///
/// Returns [`ExportError::MissingTemplateKey`] if the template has no
/// `MARKER_SUPERSONIC_INLET= ( Inlet, T, P, u, ... )` entry.
pub fn replace_inlet_marker(
    text: &str,
    temperature: f64,
    pressure: f64,
    velocity: f64,
) -> Result<String, ExportError> {
    let replaced = SUPERSONIC_INLET.replace_all(text, |caps: &Captures<'_>| {
        format!(
            "{}{}, {}, {velocity:.6}",
            &caps["lhs"],
            format_number(temperature),
            format_number(pressure)
        )
    });
    match replaced {
        Cow::Borrowed(_) => Err(ExportError::MissingTemplateKey {
            key: "MARKER_SUPERSONIC_INLET".to_string(),
        }),
        Cow::Owned(text) => Ok(text),
    }
}

/// Upper-case extension of `mesh_filename` (`wedge.msh` -> `MSH`).
#[must_use]
pub fn mesh_format(mesh_filename: &str) -> String {
    mesh_filename
        .rsplit_once('.')
        .map_or_else(String::new, |(_, ext)| ext.to_uppercase())
}

/// Produce the configuration text for one case.
///
/// # Errors
///
/// Returns [`ExportError::MissingTemplateKey`] naming the first
/// required entry the template lacks.
pub fn render_case(
    template: &str,
    case: &SweepCase,
    gas: &GasProperties,
    mesh_filename: &str,
) -> Result<String, ExportError> {
    let velocity = case.velocity(gas);
    let text = replace_value(template, "MACH_NUMBER", &format_number(case.mach))?;
    let text = replace_value(
        &text,
        "FREESTREAM_TEMPERATURE",
        &format_number(case.temperature),
    )?;
    let text = replace_value(&text, "FREESTREAM_PRESSURE", &format_number(case.pressure))?;
    let text = replace_inlet_marker(&text, case.temperature, case.pressure, velocity)?;
    let text = replace_value(&text, "MESH_FILENAME", mesh_filename)?;
    replace_value(&text, "MESH_FORMAT", &mesh_format(mesh_filename))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const TEMPLATE: &str = "\
% Inviscid wedge
SOLVER= EULER
MACH_NUMBER= 0.8
REF_MACH_NUMBER= 1.0
FREESTREAM_TEMPERATURE= 288.15
FREESTREAM_PRESSURE= 101325.0
% MACH_NUMBER= 5.0
MARKER_SUPERSONIC_INLET= ( Inlet, 288.15, 101325.0, 500.0, 0.0, 0.0 )
MESH_FILENAME= mesh.su2
MESH_FORMAT= SU2
";

    #[test]
    fn speed_of_sound_in_air() {
        let a = GasProperties::AIR.speed_of_sound(300.0);
        assert_relative_eq!(a, (1.4_f64 * 287.058 * 300.0).sqrt());
        assert_relative_eq!(a, 347.2, epsilon = 0.1);
    }

    #[test]
    fn velocity_scales_with_mach() {
        let case = SweepCase::new(2.0, 300.0, 101_325.0);
        let gas = GasProperties::default();
        assert_relative_eq!(case.velocity(&gas), 2.0 * gas.speed_of_sound(300.0));
    }

    #[test]
    fn case_name_replaces_dots() {
        let case = SweepCase::new(2.455, 250.0, 101_219.0);
        assert_eq!(
            case.case_name("double_ramp_0.046"),
            "double_ramp_0p046_M2p455_T250p0_P101219"
        );
    }

    #[test]
    fn grid_is_full_cross_product() {
        let cases = SweepCase::grid(&[2.0, 3.0], &[250.0, 300.0], &[90_000.0]);
        assert_eq!(cases.len(), 4);
        assert_eq!(cases[0], SweepCase::new(2.0, 250.0, 90_000.0));
        assert_eq!(cases[3], SweepCase::new(3.0, 300.0, 90_000.0));
    }

    #[test]
    fn renders_every_key() {
        let case = SweepCase::new(2.5, 300.0, 90_000.0);
        let gas = GasProperties::default();
        let text = render_case(TEMPLATE, &case, &gas, "wedge.msh").unwrap();

        assert!(text.contains("MACH_NUMBER= 2.5\n"));
        assert!(text.contains("FREESTREAM_TEMPERATURE= 300.0\n"));
        assert!(text.contains("FREESTREAM_PRESSURE= 90000.0\n"));
        assert!(text.contains("MESH_FILENAME= wedge.msh\n"));
        assert!(text.contains("MESH_FORMAT= MSH\n"));

        let velocity = format!("{:.6}", case.velocity(&gas));
        assert!(text.contains(&format!(
            "MARKER_SUPERSONIC_INLET= ( Inlet, 300.0, 90000.0, {velocity}, 0.0, 0.0 )"
        )));
    }

    #[test]
    fn unrelated_and_commented_lines_are_untouched() {
        let case = SweepCase::new(2.5, 300.0, 90_000.0);
        let text = render_case(TEMPLATE, &case, &GasProperties::default(), "wedge.msh").unwrap();
        assert!(text.contains("REF_MACH_NUMBER= 1.0\n"));
        assert!(text.contains("% MACH_NUMBER= 5.0\n"));
        assert!(text.contains("SOLVER= EULER\n"));
    }

    #[test]
    fn missing_key_is_reported() {
        let template = TEMPLATE.replace("FREESTREAM_PRESSURE= 101325.0\n", "");
        let err = render_case(
            &template,
            &SweepCase::new(2.0, 250.0, 1.0),
            &GasProperties::default(),
            "m.msh",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ExportError::MissingTemplateKey { ref key } if key == "FREESTREAM_PRESSURE"
        ));
        assert_eq!(err.kind(), "missing_template_key");
    }

    #[test]
    fn missing_inlet_marker_is_reported() {
        let err = replace_inlet_marker("MACH_NUMBER= 2.0\n", 1.0, 1.0, 1.0).unwrap_err();
        assert!(matches!(
            err,
            ExportError::MissingTemplateKey { ref key } if key == "MARKER_SUPERSONIC_INLET"
        ));
    }

    #[test]
    fn mesh_format_from_extension() {
        assert_eq!(mesh_format("a.b.msh"), "MSH");
        assert_eq!(mesh_format("mesh.su2"), "SU2");
        assert_eq!(mesh_format("noext"), "");
    }
}
