//! Pipeline Configuration
//!
//! Render geometry and request defaults. Every field has a default so a
//! partial JSON file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::render::{dpi_to_ppm, parse_color};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Width of one bar module in pixels
    #[serde(default = "default_module_width")]
    pub module_width: u32,
    /// Bar height in pixels
    #[serde(default = "default_bar_height")]
    pub bar_height: u32,
    /// Horizontal quiet zone on each side, in modules
    #[serde(default = "default_quiet_zone")]
    pub quiet_zone: u32,
    #[serde(default = "default_vertical_margin")]
    pub vertical_margin: u32,
    #[serde(default = "default_resolution")]
    pub default_resolution: u32,
    /// Upper bound for a requested or default DPI
    #[serde(default = "default_max_resolution")]
    pub max_resolution: u32,
    #[serde(default = "default_color")]
    pub default_color: String,
    /// Upper bound for either side of a requested size
    #[serde(default = "default_max_dimension")]
    pub max_dimension: u32,
}

fn default_module_width() -> u32 { 2 }
fn default_bar_height() -> u32 { 120 }
fn default_quiet_zone() -> u32 { 10 }
fn default_vertical_margin() -> u32 { 10 }
fn default_resolution() -> u32 { 300 }
fn default_max_resolution() -> u32 { 1200 }
fn default_color() -> String { "#000000".to_string() }
fn default_max_dimension() -> u32 { 10_000 }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            module_width: default_module_width(),
            bar_height: default_bar_height(),
            quiet_zone: default_quiet_zone(),
            vertical_margin: default_vertical_margin(),
            default_resolution: default_resolution(),
            max_resolution: default_max_resolution(),
            default_color: default_color(),
            max_dimension: default_max_dimension(),
        }
    }
}

impl PipelineConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    /// Reject geometry that would render an empty image.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.module_width == 0 || self.bar_height == 0 {
            return Err(ConfigError::Invalid(
                "moduleWidth and barHeight must be positive".to_string(),
            ));
        }
        if self.default_resolution == 0 {
            return Err(ConfigError::Invalid("defaultResolution must be positive".to_string()));
        }
        if self.max_dimension == 0 {
            return Err(ConfigError::Invalid("maxDimension must be positive".to_string()));
        }
        if dpi_to_ppm(self.max_resolution).is_none() {
            return Err(ConfigError::Invalid(format!(
                "maxResolution {} cannot be stored in PNG metadata",
                self.max_resolution
            )));
        }
        if self.default_resolution > self.max_resolution {
            return Err(ConfigError::Invalid(format!(
                "defaultResolution {} exceeds maxResolution {}",
                self.default_resolution, self.max_resolution
            )));
        }
        if parse_color(&self.default_color).is_none() {
            return Err(ConfigError::Invalid(format!(
                "defaultColor {:?} is not a hex color",
                self.default_color
            )));
        }
        Ok(())
    }
}
