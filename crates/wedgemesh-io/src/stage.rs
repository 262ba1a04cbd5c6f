//! Raster stages that `inspect` can dump.

use std::fmt;

/// Identifier for an image-valued pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Stage 1: field rendered through the colormap.
    Raster,
    /// Stage 2: denoised intensity.
    Intensity,
    /// Stage 3: binary wedge mask.
    Mask,
}

impl StageId {
    /// All stages in pipeline order.
    pub const ALL: [Self; 3] = [Self::Raster, Self::Intensity, Self::Mask];

    /// Display label for the stage.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Raster => "Raster",
            Self::Intensity => "Intensity",
            Self::Mask => "Mask",
        }
    }

    /// Suffix appended to the unit's stem when the stage is written to
    /// disk, e.g. `<stem>_<key>_mask.png`.
    #[must_use]
    pub const fn file_suffix(self) -> &'static str {
        match self {
            Self::Raster => "raster",
            Self::Intensity => "intensity",
            Self::Mask => "mask",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_contains_every_variant_once() {
        let mut seen = std::collections::HashSet::new();
        for stage in StageId::ALL {
            assert!(seen.insert(stage), "Duplicate stage in ALL: {stage}");
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn suffixes_are_distinct_lowercase() {
        let suffixes: std::collections::HashSet<_> =
            StageId::ALL.iter().map(|s| s.file_suffix()).collect();
        assert_eq!(suffixes.len(), StageId::ALL.len());
        for s in suffixes {
            assert_eq!(s, s.to_lowercase());
        }
    }
}
