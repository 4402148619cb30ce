//! Explicit configuration for every step of the slicing pipeline.
//!
//! Each transform takes its options as a plain structure instead of relying on
//! omitted arguments. All structures deserialize from JSON, and any field left
//! out takes the documented default below.
//!
//! ```no_run
//! # use volume_slicer::config::PipelineConfig;
//! let config = PipelineConfig::load("pipeline.json").expect("valid config");
//! assert!(config.slice.width > 0);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// Default Values
// =============================================================================

/// Default lower bound of the output intensity range.
pub const DEFAULT_OUT_MIN: f32 = 0.0;

/// Default upper bound of the output intensity range.
pub const DEFAULT_OUT_MAX: f32 = 255.0;

/// Default lower percentile for contrast stretching.
pub const DEFAULT_PERCENTILE_MIN: f32 = 10.0;

/// Default upper percentile for contrast stretching.
pub const DEFAULT_PERCENTILE_MAX: f32 = 90.0;

/// Default number of histogram bins used by equalization.
pub const DEFAULT_HISTOGRAM_BINS: usize = 256;

/// Default canonical slice width (first array axis).
pub const DEFAULT_SLICE_WIDTH: usize = 512;

/// Default canonical slice height (second array axis).
pub const DEFAULT_SLICE_HEIGHT: usize = 512;

/// Threshold separating background from foreground in label slices.
pub const DEFAULT_LABEL_THRESHOLD: f32 = 127.5;

/// Default extension of reconstructed volumes.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "nii.gz";

// =============================================================================
// Intensity
// =============================================================================

/// Options for [`crate::intensity::normalize`].
///
/// `in_min`/`in_max` fall back to the data's own extrema when absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub in_min: Option<f32>,
    pub in_max: Option<f32>,
    pub out_min: f32,
    pub out_max: f32,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            in_min: None,
            in_max: None,
            out_min: DEFAULT_OUT_MIN,
            out_max: DEFAULT_OUT_MAX,
        }
    }
}

impl NormalizeConfig {
    pub fn with_input_range(mut self, min: f32, max: f32) -> Self {
        self.in_min = Some(min);
        self.in_max = Some(max);
        self
    }

    pub fn with_output_range(mut self, min: f32, max: f32) -> Self {
        self.out_min = min;
        self.out_max = max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_range("output", self.out_min, self.out_max)?;
        if let (Some(min), Some(max)) = (self.in_min, self.in_max) {
            check_range("input", min, max)?;
        }
        Ok(())
    }
}

/// Options for [`crate::intensity::adjust_contrast`].
///
/// `out_min`/`out_max` fall back to the data's own extrema when absent.
/// Percentiles are computed over nonzero voxels only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContrastConfig {
    pub out_min: Option<f32>,
    pub out_max: Option<f32>,
    pub pmin: f32,
    pub pmax: f32,
    pub bins: usize,
}

impl Default for ContrastConfig {
    fn default() -> Self {
        Self {
            out_min: None,
            out_max: None,
            pmin: DEFAULT_PERCENTILE_MIN,
            pmax: DEFAULT_PERCENTILE_MAX,
            bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl ContrastConfig {
    pub fn with_output_range(mut self, min: f32, max: f32) -> Self {
        self.out_min = Some(min);
        self.out_max = Some(max);
        self
    }

    pub fn with_percentiles(mut self, pmin: f32, pmax: f32) -> Self {
        self.pmin = pmin;
        self.pmax = pmax;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for p in [self.pmin, self.pmax] {
            if !(0.0..=100.0).contains(&p) {
                return Err(Error::InvalidConfig(format!(
                    "percentile {p} is outside 0..=100"
                )));
            }
        }
        if self.pmin > self.pmax {
            return Err(Error::InvalidConfig(format!(
                "pmin {} is greater than pmax {}",
                self.pmin, self.pmax
            )));
        }
        if self.bins == 0 {
            return Err(Error::InvalidConfig("histogram needs at least one bin".into()));
        }
        if let (Some(min), Some(max)) = (self.out_min, self.out_max) {
            check_range("output", min, max)?;
        }
        Ok(())
    }
}

// =============================================================================
// Slicing
// =============================================================================

/// Canonical in-plane size every slice is resampled to before it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceConfig {
    pub width: usize,
    pub height: usize,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_SLICE_WIDTH,
            height: DEFAULT_SLICE_HEIGHT,
        }
    }
}

impl SliceConfig {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "slice size {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Configuration of a full slice/rebuild pipeline.
///
/// At most one of `contrast` and `normalize` is applied before slicing;
/// `contrast` wins when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub slice: SliceConfig,
    pub normalize: Option<NormalizeConfig>,
    pub contrast: Option<ContrastConfig>,
    pub output_extension: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            slice: SliceConfig::default(),
            normalize: None,
            contrast: None,
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Read a JSON configuration file and validate it
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.slice.validate()?;
        if let Some(normalize) = &self.normalize {
            normalize.validate()?;
        }
        if let Some(contrast) = &self.contrast {
            contrast.validate()?;
        }
        if self.output_extension.trim_matches('.').is_empty() {
            return Err(Error::InvalidConfig("output extension is empty".into()));
        }
        Ok(())
    }
}

fn check_range(which: &str, min: f32, max: f32) -> Result<()> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(Error::InvalidConfig(format!(
            "{which} range [{min}, {max}] is not an ordered finite pair"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config = PipelineConfig::from_json(r#"{ "slice": { "width": 256 } }"#).unwrap();
        assert_eq!(config.slice.width, 256);
        assert_eq!(config.slice.height, DEFAULT_SLICE_HEIGHT);
        assert_eq!(config.output_extension, DEFAULT_OUTPUT_EXTENSION);
        assert!(config.contrast.is_none());
    }

    #[test]
    fn test_contrast_section_defaults() {
        let config = PipelineConfig::from_json(r#"{ "contrast": { "pmax": 95.0 } }"#).unwrap();
        let contrast = config.contrast.unwrap();
        assert_eq!(contrast.pmin, DEFAULT_PERCENTILE_MIN);
        assert_eq!(contrast.pmax, 95.0);
        assert_eq!(contrast.bins, DEFAULT_HISTOGRAM_BINS);
    }

    #[test]
    fn test_rejects_zero_slice_size() {
        let result = PipelineConfig::from_json(r#"{ "slice": { "width": 0, "height": 8 } }"#);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_inverted_percentiles() {
        let config = ContrastConfig::default().with_percentiles(90.0, 10.0);
        assert!(config.validate().is_err());
        let config = ContrastConfig::default().with_percentiles(-1.0, 10.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_output_range() {
        let config = NormalizeConfig::default().with_output_range(1.0, 0.0);
        assert!(config.validate().is_err());
    }
}
