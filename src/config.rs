//! Configuration management for the spectral pipeline
//!
//! Thresholds, resolutions and transform parameters are loaded from a JSON
//! file so that tuning runs need no recompilation. CLI flags override the
//! loaded values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::noise::DEFAULT_RESAMPLE_RESOLUTION;
use crate::spectrum::transform::{DEFAULT_FREQUENCY_MULTIPLIER, DEFAULT_KAISER_BETA};

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub peaks: PeakConfig,
    #[serde(default)]
    pub noise: NoiseConfig,
    #[serde(default)]
    pub cutting: CuttingConfig,
}

/// Time-domain transform parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Lower band edge (scaled units); required by the CLI if unset
    pub start_frequency: Option<f64>,
    /// Upper band edge (scaled units)
    pub end_frequency: Option<f64>,
    /// Samples per second of the input
    pub sample_rate: Option<f64>,
    /// Divides raw bin frequencies (1e6 → MHz)
    pub frequency_multiplier: f64,
    pub kaiser_beta: f64,
    /// Column of a multi-column time-domain table (negative counts from the end)
    pub column: isize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            start_frequency: None,
            end_frequency: None,
            sample_rate: None,
            frequency_multiplier: DEFAULT_FREQUENCY_MULTIPLIER,
            kaiser_beta: DEFAULT_KAISER_BETA,
            column: -1,
        }
    }
}

/// Peak picking thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakConfig {
    pub threshold_min: f64,
    /// Upper bound; `None` (or 0) disables it
    pub threshold_max: Option<f64>,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            threshold_min: 0.001,
            threshold_max: None,
        }
    }
}

/// Noise estimation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Initial guess; must sit above the baseline floor
    pub seed_threshold: f64,
    pub resample_resolution: f64,
    pub sweep_start: f64,
    pub sweep_end: f64,
    pub sweep_steps: usize,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed_threshold: 0.01,
            resample_resolution: DEFAULT_RESAMPLE_RESOLUTION,
            sweep_start: 0.0002,
            sweep_end: 0.1,
            sweep_steps: 50,
        }
    }
}

/// Cutter defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CuttingConfig {
    /// Fixed window width in frequency units
    pub width: f64,
}

impl Default for CuttingConfig {
    fn default() -> Self {
        Self { width: 0.7 }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or defaults if the file is missing or the
    /// JSON is invalid (a warning is logged).
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}
