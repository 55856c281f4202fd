//! Configuration management for the SNR pipeline
//!
//! This module provides runtime configuration loading from JSON files, so
//! estimator choice, classification edges and dataset path conventions can be
//! changed without recompilation. Every section has defaults and may be
//! omitted from the file. Command-line flags override file values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use crate::analysis::classifier::{
    BinEdges, ResultClassifier, DEFAULT_COARSE_EDGES, DEFAULT_FINE_EDGES, DEFAULT_THRESHOLD_HIGH,
    DEFAULT_THRESHOLD_LOW,
};
use crate::analysis::noise::{DEFAULT_CLIP_MAX_ITERS, DEFAULT_CLIP_SIGMA};
use crate::analysis::{NoiseEstimator, SnrPipeline, ZeroNoisePolicy};
use crate::error::ConfigError;
use crate::loader::PathRewrite;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub noise: NoiseConfig,
    pub snr: SnrConfig,
    pub classification: ClassificationConfig,
    pub pipeline: PipelineConfig,
    pub dataset: DatasetConfig,
}

/// Background noise estimation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Strategy name: `sigma_clip` or `mad`
    pub estimator: String,
    /// Clipping threshold in standard deviations (sigma_clip only)
    pub sigma: f64,
    /// Clipping passes; `null` iterates until convergence (sigma_clip only)
    pub max_iters: Option<usize>,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            estimator: "sigma_clip".to_string(),
            sigma: DEFAULT_CLIP_SIGMA,
            max_iters: DEFAULT_CLIP_MAX_ITERS,
        }
    }
}

/// SNR computation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnrConfig {
    /// `exclude` or `unbounded`
    pub zero_noise_policy: String,
}

impl Default for SnrConfig {
    fn default() -> Self {
        Self {
            zero_noise_policy: ZeroNoisePolicy::default().name().to_string(),
        }
    }
}

/// Reporting bins and thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub coarse_edges: Vec<f64>,
    pub threshold_low: f64,
    pub threshold_high: f64,
    pub fine_edges: Vec<f64>,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            coarse_edges: DEFAULT_COARSE_EDGES.to_vec(),
            threshold_low: DEFAULT_THRESHOLD_LOW,
            threshold_high: DEFAULT_THRESHOLD_HIGH,
            fine_edges: DEFAULT_FINE_EDGES.to_vec(),
        }
    }
}

/// Batch execution parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker threads; `None` uses the global rayon pool
    pub workers: Option<usize>,
    /// Log progress every N processed samples
    pub log_every_n_samples: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: None,
            log_every_n_samples: 100,
        }
    }
}

/// Dataset path conventions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Prefix rewrite applied to every line of the sample list
    pub path_rewrite: Option<PathRewrite>,
    /// Path component where output keys start (e.g. `MLDataset_cleaned`)
    pub output_root_marker: Option<String>,
}

/// Typed values derived from an [`AppConfig`]
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub estimator: NoiseEstimator,
    pub zero_noise: ZeroNoisePolicy,
    pub classifier: ResultClassifier,
}

impl ResolvedConfig {
    pub fn pipeline(&self) -> SnrPipeline {
        SnrPipeline::new(self.estimator, self.zero_noise)
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// * `Ok(AppConfig)` - Loaded configuration, or defaults if the file does not exist
    /// * `Err(ConfigError::Parse)` - The file exists but cannot be read or parsed
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config = Self::from_json(&contents).map_err(|err| match err {
                    ConfigError::Parse { reason, .. } => ConfigError::Parse {
                        path: path.display().to_string(),
                        reason,
                    },
                    other => other,
                })?;
                log::info!("[Config] Loaded configuration from {:?}", path);
                Ok(config)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::warn!(
                    "[Config] Config file {:?} not found. Using defaults.",
                    path
                );
                Ok(Self::default())
            }
            Err(err) => Err(ConfigError::Parse {
                path: path.display().to_string(),
                reason: err.to_string(),
            }),
        }
    }

    /// Parse configuration from a JSON string
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(contents).map_err(|err| ConfigError::Parse {
            path: "<inline>".to_string(),
            reason: err.to_string(),
        })
    }

    /// Convert textual choices into typed pipeline values
    ///
    /// Unknown strategy or policy names and malformed edges are fatal.
    pub fn validate(&self) -> Result<ResolvedConfig, ConfigError> {
        let estimator =
            NoiseEstimator::from_name(&self.noise.estimator, self.noise.sigma, self.noise.max_iters)?;
        if let NoiseEstimator::SigmaClip(clip) = &estimator {
            if !clip.sigma.is_finite() || clip.sigma <= 0.0 {
                return Err(ConfigError::Parse {
                    path: "noise.sigma".to_string(),
                    reason: format!("sigma must be positive (got {})", clip.sigma),
                });
            }
        }

        let zero_noise = self.snr.zero_noise_policy.parse::<ZeroNoisePolicy>()?;

        let classification = &self.classification;
        let classifier = ResultClassifier::new(
            BinEdges::new(classification.coarse_edges.clone())?,
            BinEdges::new(classification.fine_edges.clone())?,
            classification.threshold_low,
            classification.threshold_high,
        )?;

        Ok(ResolvedConfig {
            estimator,
            zero_noise,
            classifier,
        })
    }
}
