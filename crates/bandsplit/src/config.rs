//! Run configuration.
//!
//! One immutable [`SplitConfig`] is built at startup (defaults, optionally a
//! JSON file, then command-line overrides) and passed by reference through
//! every stage. There is no process-wide mutable state.

use std::path::Path;

use crate::background::BackgroundPolicy;
use crate::error::{Result, SplitError};
use crate::persist::{OutputFormat, PersistConfig};

/// Probe size (pixels) of the corner squares used by [`BackgroundPolicy::AutoSample`].
pub const DEFAULT_CORNER_PROBE_PX: u32 = 10;

/// Factor applied to seed offsets by the wider-scan option.
pub const DEFAULT_SCAN_WIDER_FACTOR: f64 = 0.9;

/// Band scanning parameters.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Thickness of a candidate band along the scan axis (pixels, > 0).
    pub band_thickness: u32,
    /// Pixels excluded at both ends of every scanned line.
    pub margin: u32,
    /// Fraction of mismatching pixels tolerated per line, in [0, 1].
    pub diff_threshold: f64,
    /// Per-channel tolerance; a pixel mismatches when its squared distance
    /// exceeds `3 * color_tolerance^2`.
    pub color_tolerance: u32,
    /// Accept pixels close to white or black in addition to the reference.
    pub fuzzy_matching: bool,
    /// Multiplier (< 1) applied to seed offsets so the search starts earlier.
    pub scan_wider_factor: Option<f64>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            band_thickness: 20,
            margin: 0,
            diff_threshold: 0.05,
            color_tolerance: 1,
            fuzzy_matching: false,
            scan_wider_factor: None,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<()> {
        if self.band_thickness == 0 {
            return Err(SplitError::config("band_thickness must be > 0"));
        }
        if !self.diff_threshold.is_finite() || !(0.0..=1.0).contains(&self.diff_threshold) {
            return Err(SplitError::config(format!(
                "diff_threshold must be within [0, 1], got {}",
                self.diff_threshold
            )));
        }
        if let Some(f) = self.scan_wider_factor {
            if !f.is_finite() || f <= 0.0 || f > 1.0 {
                return Err(SplitError::config(format!(
                    "scan_wider_factor must be within (0, 1], got {}",
                    f
                )));
            }
        }
        Ok(())
    }
}

/// Handling of the final slice of a plan.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TailConfig {
    /// Merge a final slice narrower than half a unit into its predecessor.
    pub merge_thin: bool,
    /// Drop a final slice whose pixel standard deviation is below this value.
    pub blank_stddev_threshold: Option<f64>,
}

/// Complete configuration of a split run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Number of slices requested (>= 2).
    pub units: u32,
    /// Background reference policy.
    pub background: BackgroundPolicy,
    /// Band scanning parameters.
    pub scan: ScanConfig,
    /// Abort when the primary dimension is at or below this many pixels.
    pub size_threshold: u32,
    /// Cut with vertical lines even when the image is taller than wide.
    pub split_vertically: bool,
    /// Corner square size used by [`BackgroundPolicy::AutoSample`].
    pub corner_probe_px: u32,
    /// Final-slice policy.
    pub tail: TailConfig,
    /// Encode slices in this format instead of the input's container format.
    pub output_format: Option<OutputFormat>,
    /// Persistence strategy ladder.
    pub persist: PersistConfig,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            units: 2,
            background: BackgroundPolicy::default(),
            scan: ScanConfig::default(),
            size_threshold: 0,
            split_vertically: false,
            corner_probe_px: DEFAULT_CORNER_PROBE_PX,
            tail: TailConfig::default(),
            output_format: None,
            persist: PersistConfig::default(),
        }
    }
}

impl SplitConfig {
    /// Default configuration for `units` slices.
    pub fn with_units(units: u32) -> Self {
        Self {
            units,
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| SplitError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|e| {
            SplitError::config(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Whether fuzzy matching is on, either explicitly or through the policy.
    pub fn fuzzy(&self) -> bool {
        self.scan.fuzzy_matching || self.background.implies_fuzzy()
    }

    pub fn validate(&self) -> Result<()> {
        if self.units < 2 {
            return Err(SplitError::config(format!(
                "units must be >= 2, got {}",
                self.units
            )));
        }
        if self.corner_probe_px == 0 {
            return Err(SplitError::config("corner_probe_px must be > 0"));
        }
        if let Some(t) = self.tail.blank_stddev_threshold {
            if !t.is_finite() || t < 0.0 {
                return Err(SplitError::config(format!(
                    "blank_stddev_threshold must be finite and >= 0, got {}",
                    t
                )));
            }
        }
        self.scan.validate()?;
        self.persist.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn defaults_match_cli_defaults() {
        let cfg = SplitConfig::default();
        assert_eq!(cfg.scan.band_thickness, 20);
        assert_eq!(cfg.scan.margin, 0);
        approx::assert_relative_eq!(cfg.scan.diff_threshold, 0.05);
        assert_eq!(cfg.scan.color_tolerance, 1);
        assert_eq!(cfg.size_threshold, 0);
        assert_eq!(cfg.corner_probe_px, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(SplitConfig::with_units(1).validate().unwrap_err().is_config());

        let mut cfg = SplitConfig::with_units(3);
        cfg.scan.band_thickness = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = SplitConfig::with_units(3);
        cfg.scan.diff_threshold = 1.5;
        assert!(cfg.validate().is_err());

        let mut cfg = SplitConfig::with_units(3);
        cfg.scan.scan_wider_factor = Some(0.0);
        assert!(cfg.validate().is_err());

        let mut cfg = SplitConfig::with_units(3);
        cfg.tail.blank_stddev_threshold = Some(-1.0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn fuzzy_follows_policy() {
        let mut cfg = SplitConfig::default();
        assert!(!cfg.fuzzy());
        cfg.background = BackgroundPolicy::Fuzzy;
        assert!(cfg.fuzzy());
        cfg.background = BackgroundPolicy::Explicit(Color::WHITE);
        cfg.scan.fuzzy_matching = true;
        assert!(cfg.fuzzy());
    }

    #[test]
    fn loads_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("split.json");
        std::fs::write(
            &path,
            r##"{ "units": 4, "background": "#135fd8", "scan": { "band_thickness": 12 } }"##,
        )
        .unwrap();

        let cfg = SplitConfig::from_json_file(&path).unwrap();
        assert_eq!(cfg.units, 4);
        assert_eq!(
            cfg.background,
            BackgroundPolicy::Explicit(Color::new(0x13, 0x5f, 0xd8))
        );
        assert_eq!(cfg.scan.band_thickness, 12);
        approx::assert_relative_eq!(cfg.scan.diff_threshold, 0.05);
    }

    #[test]
    fn json_errors_are_config_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "units": 1 }"#).unwrap();
        assert!(SplitConfig::from_json_file(&path).unwrap_err().is_config());

        std::fs::write(&path, r#"{ "background": "mauve" }"#).unwrap();
        assert!(SplitConfig::from_json_file(&path).unwrap_err().is_config());

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            SplitConfig::from_json_file(&missing).unwrap_err(),
            SplitError::Io { .. }
        ));
    }
}
