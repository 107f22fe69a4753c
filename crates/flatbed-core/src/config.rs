// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan pipeline configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FlatbedError, Result};

/// Settings for a complete scan run. Defaults reproduce the reference tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Height the photo is resized to before detection. `None` detects on the
    /// original resolution.
    pub working_height: Option<u32>,
    pub preprocess: PreprocessConfig,
    pub detect: DetectConfig,
    pub rectify: RectifyConfig,
    pub finish: FinishConfig,
    /// Capture intermediate images (edge map, outline overlay, flattened page).
    pub debug: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            working_height: Some(500),
            preprocess: PreprocessConfig::default(),
            detect: DetectConfig::default(),
            rectify: RectifyConfig::default(),
            finish: FinishConfig::default(),
            debug: false,
        }
    }
}

/// Edge-map preparation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Radius of the disk used for morphological opening and closing.
    pub morph_radius: u8,
    /// Odd Gaussian kernel size applied before edge detection.
    pub blur_kernel: u32,
    /// Canny hysteresis thresholds on gradient magnitude.
    pub canny_low: f32,
    pub canny_high: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            morph_radius: 2,
            blur_kernel: 7,
            canny_low: 75.0,
            canny_high: 100.0,
        }
    }
}

/// Quadrilateral detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// Simplification tolerance as a fraction of each contour's perimeter.
    pub epsilon_ratio: f64,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            epsilon_ratio: 0.02,
        }
    }
}

/// Perspective rectification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    /// Smallest fraction of the quadrilateral's area that any three corners
    /// may span before the outline is rejected as degenerate. Independent of
    /// image resolution; a rectangle scores 0.5.
    pub min_corner_ratio: f64,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            min_corner_ratio: 0.02,
        }
    }
}

/// Scan-like finishing of the flattened page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinishConfig {
    /// Odd side length of the adaptive-threshold neighbourhood.
    pub block_size: u32,
    /// Constant subtracted from the local mean.
    pub offset: i32,
    /// Odd Gaussian kernel size used to soften thresholding artifacts.
    pub blur_kernel: u32,
}

impl Default for FinishConfig {
    fn default() -> Self {
        Self {
            block_size: 9,
            offset: 15,
            blur_kernel: 3,
        }
    }
}

impl ScanConfig {
    /// Load a JSON configuration file and validate it. Missing fields take
    /// their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.working_height == Some(0) {
            return Err(invalid("working_height must be positive"));
        }
        check_odd_kernel("preprocess.blur_kernel", self.preprocess.blur_kernel)?;
        check_odd_kernel("finish.blur_kernel", self.finish.blur_kernel)?;
        check_odd_kernel("finish.block_size", self.finish.block_size)?;

        let p = &self.preprocess;
        if !(p.canny_low >= 0.0 && p.canny_low <= p.canny_high) {
            return Err(invalid(format!(
                "canny thresholds must satisfy 0 <= low <= high (got {} / {})",
                p.canny_low, p.canny_high
            )));
        }
        if !(self.detect.epsilon_ratio > 0.0 && self.detect.epsilon_ratio < 1.0) {
            return Err(invalid(format!(
                "detect.epsilon_ratio must be in (0, 1), got {}",
                self.detect.epsilon_ratio
            )));
        }
        if !(0.0..0.5).contains(&self.rectify.min_corner_ratio) {
            return Err(invalid(format!(
                "rectify.min_corner_ratio must be in [0, 0.5), got {}",
                self.rectify.min_corner_ratio
            )));
        }
        Ok(())
    }
}

fn check_odd_kernel(name: &str, size: u32) -> Result<()> {
    if size == 0 || size % 2 == 0 {
        return Err(invalid(format!("{name} must be a positive odd number, got {size}")));
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> FlatbedError {
    FlatbedError::InvalidConfig(msg.into())
}
