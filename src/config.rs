//! Dashboard Configuration
//! JSON settings file with defaults for every field; CLI flags override it.

use crate::data::{LoadOptions, DEFAULT_SOURCE, TOP_N};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Dataset URL or path
    pub source: String,
    /// Aggregate rows dropped at load time
    pub excluded_locations: Vec<String>,
    /// Fixed ceiling of the map color scale
    pub color_scale_max: f64,
    /// Length of the two rankings
    pub top_n: usize,
    /// Tick-label stride over distinct dates
    pub mark_every: usize,
    /// Initial slider position
    pub initial_cutoff: u32,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            excluded_locations: vec!["World".to_string()],
            color_scale_max: 16_000_000.0,
            top_n: TOP_N,
            mark_every: 30,
            initial_cutoff: 1,
            window_width: 1400.0,
            window_height: 900.0,
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content)
    }

    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.trim().is_empty() {
            return Err(ConfigError::Invalid("source must not be empty".to_string()));
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".to_string()));
        }
        if self.mark_every == 0 {
            return Err(ConfigError::Invalid(
                "mark_every must be at least 1".to_string(),
            ));
        }
        if !self.color_scale_max.is_finite() || self.color_scale_max <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "color_scale_max must be positive, got {}",
                self.color_scale_max
            )));
        }
        Ok(())
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            excluded_locations: self.excluded_locations.clone(),
        }
    }
}
