//! Simulation parameters encoded in field filenames.
//!
//! Snapshot archives are named
//! `<prefix>_<ramp1>[_<ramp2>]_ma_<mach>_pres_<pressure>...`, for example
//! `double_ramp_0.046_0.0112_ma_2.455_pres_101219_x.npz`. A missing
//! `ramp2` means a single-ramp geometry.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[allow(clippy::expect_used)]
static FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<prefix>.*?)_(?P<ramp1>\d+\.\d+)(?:_(?P<ramp2>\d+\.\d+))?_ma_(?P<mach>\d+\.\d+)_pres_(?P<pres>\d+)",
    )
    .expect("filename pattern is a valid regex")
});

/// Parameters parsed from a snapshot filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Everything before the first ramp value (e.g. `double_ramp`).
    pub prefix: String,
    /// First ramp parameter.
    pub ramp1: f64,
    /// Second ramp parameter; `None` for single-ramp geometries.
    pub ramp2: Option<f64>,
    /// Freestream Mach number.
    pub mach: f64,
    /// Freestream pressure in pascals.
    pub pressure: u32,
}

impl FileMetadata {
    /// Parse a filename (with or without directory or extension).
    ///
    /// Returns `None` when the name does not follow the convention.
    #[must_use]
    pub fn parse(filename: &str) -> Option<Self> {
        let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
        let caps = FILENAME_PATTERN.captures(name)?;

        let ramp2 = match caps.name("ramp2") {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        };

        Some(Self {
            prefix: caps.name("prefix")?.as_str().to_string(),
            ramp1: caps.name("ramp1")?.as_str().parse().ok()?,
            ramp2,
            mach: caps.name("mach")?.as_str().parse().ok()?,
            pressure: caps.name("pres")?.as_str().parse().ok()?,
        })
    }

    /// Whether the geometry has a single ramp.
    #[must_use]
    pub const fn is_single_ramp(&self) -> bool {
        self.ramp2.is_none()
    }
}

/// Predicate over [`FileMetadata`].
///
/// Every `Some` field is a constraint; a record matches when all of
/// them hold. The default filter accepts everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataFilter {
    /// Exact first-ramp value.
    pub ramp1: Option<f64>,
    /// Exact second-ramp value. Single-ramp records never match.
    pub ramp2: Option<f64>,
    /// Inclusive lower Mach bound.
    pub min_mach: Option<f64>,
    /// Inclusive upper Mach bound.
    pub max_mach: Option<f64>,
}

impl MetadataFilter {
    /// Whether `meta` satisfies every active constraint.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn matches(&self, meta: &FileMetadata) -> bool {
        if self.ramp1.is_some_and(|r| meta.ramp1 != r) {
            return false;
        }
        if self.ramp2.is_some_and(|r| meta.ramp2 != Some(r)) {
            return false;
        }
        if self.min_mach.is_some_and(|m| meta.mach < m) {
            return false;
        }
        if self.max_mach.is_some_and(|m| meta.mach > m) {
            return false;
        }
        true
    }
}
