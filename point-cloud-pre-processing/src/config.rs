/// Processing configuration with defaults from the shared constants crate
use constants::processing::{
    BIN_WIDTH_FACTOR, GRID_SIZE, LINE_TOLERANCE, MIN_SLICE_POINTS, SLICE_COUNT, SLICE_TOLERANCE,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{PreprocessError, Result};

/// Global processing options. Every field may be omitted from a config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Slices generated per plane family.
    pub slice_count: usize,
    /// Samples per free axis of a slice grid, and positions per line profile.
    pub grid_size: usize,
    /// Slice window half-width as a fraction of the fixed axis span.
    pub slice_tolerance: f64,
    /// Centerline window fraction. Recorded with the metadata, not used by
    /// the binning profiler.
    pub line_tolerance: f64,
    /// Profile bin width as a multiple of the position spacing.
    pub bin_width_factor: f64,
    /// Windows selecting fewer points than this produce no slice.
    pub min_slice_points: usize,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            slice_count: SLICE_COUNT,
            grid_size: GRID_SIZE,
            slice_tolerance: SLICE_TOLERANCE,
            line_tolerance: LINE_TOLERANCE,
            bin_width_factor: BIN_WIDTH_FACTOR,
            min_slice_points: MIN_SLICE_POINTS,
        }
    }
}

impl PreprocessConfig {
    /// Load a JSON config file; absent fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| PreprocessError::io(path, e))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.slice_count == 0 {
            return Err(PreprocessError::InvalidConfig(
                "slice_count must be at least 1".into(),
            ));
        }
        if self.grid_size < 2 {
            return Err(PreprocessError::InvalidConfig(format!(
                "grid_size must be at least 2, got {}",
                self.grid_size
            )));
        }
        for (name, value) in [
            ("slice_tolerance", self.slice_tolerance),
            ("line_tolerance", self.line_tolerance),
            ("bin_width_factor", self.bin_width_factor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PreprocessError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_constants() {
        let config = PreprocessConfig::default();
        assert_eq!(config.slice_count, 15);
        assert_eq!(config.grid_size, 400);
        assert_eq!(config.slice_tolerance, 0.01);
        assert_eq!(config.line_tolerance, 0.05);
        assert_eq!(config.bin_width_factor, 1.1);
        assert_eq!(config.min_slice_points, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: PreprocessConfig =
            serde_json::from_str(r#"{ "grid_size": 64, "slice_count": 5 }"#).unwrap();
        assert_eq!(config.grid_size, 64);
        assert_eq!(config.slice_count, 5);
        assert_eq!(config.slice_tolerance, 0.01);
    }

    #[test]
    fn rejects_degenerate_values() {
        let config = PreprocessConfig {
            grid_size: 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PreprocessError::InvalidConfig(_))
        ));

        let config = PreprocessConfig {
            slice_tolerance: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PreprocessConfig {
            slice_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "bin_width_factor": 1.5 }"#).unwrap();

        let config = PreprocessConfig::from_json_file(&path).unwrap();
        assert_eq!(config.bin_width_factor, 1.5);
        assert_eq!(config.grid_size, 400);
    }
}
