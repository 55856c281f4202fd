// Configuration error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Configuration error code constants
///
/// Error code range: 2001-2004
pub struct ConfigErrorCodes {}

impl ConfigErrorCodes {
    /// Noise estimator name is not recognised
    pub const UNKNOWN_NOISE_ESTIMATOR: i32 = 2001;

    /// Zero-noise policy name is not recognised
    pub const UNKNOWN_ZERO_NOISE_POLICY: i32 = 2002;

    /// Bin edges or thresholds are unusable
    pub const INVALID_BIN_EDGES: i32 = 2003;

    /// Config file exists but could not be read or parsed
    pub const PARSE: i32 = 2004;
}

/// Log a configuration error with structured context
pub fn log_config_error(err: &ConfigError, context: &str) {
    error!(
        "Config error in {}: code={}, component=AppConfig, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Configuration errors
///
/// All of these are fatal: the run stops before any sample is processed
/// instead of silently falling back to a default.
///
/// Error code range: 2001-2004
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Noise estimator name is not one of the supported strategies
    UnknownNoiseEstimator { name: String },

    /// Zero-noise policy name is not one of the supported policies
    UnknownZeroNoisePolicy { name: String },

    /// Edges not finite/strictly increasing, or thresholds out of order
    InvalidBinEdges { reason: String },

    /// Config file could not be read or is not valid JSON for the schema
    Parse { path: String, reason: String },
}

impl ErrorCode for ConfigError {
    fn code(&self) -> i32 {
        match self {
            ConfigError::UnknownNoiseEstimator { .. } => {
                ConfigErrorCodes::UNKNOWN_NOISE_ESTIMATOR
            }
            ConfigError::UnknownZeroNoisePolicy { .. } => {
                ConfigErrorCodes::UNKNOWN_ZERO_NOISE_POLICY
            }
            ConfigError::InvalidBinEdges { .. } => ConfigErrorCodes::INVALID_BIN_EDGES,
            ConfigError::Parse { .. } => ConfigErrorCodes::PARSE,
        }
    }

    fn message(&self) -> String {
        match self {
            ConfigError::UnknownNoiseEstimator { name } => {
                format!(
                    "Unknown noise estimator '{}' (expected sigma_clip or mad)",
                    name
                )
            }
            ConfigError::UnknownZeroNoisePolicy { name } => {
                format!(
                    "Unknown zero-noise policy '{}' (expected exclude or unbounded)",
                    name
                )
            }
            ConfigError::InvalidBinEdges { reason } => {
                format!("Invalid classification bins: {}", reason)
            }
            ConfigError::Parse { path, reason } => {
                format!("Failed to parse config {}: {}", path, reason)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ConfigError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_codes() {
        assert_eq!(
            ConfigError::UnknownNoiseEstimator {
                name: "x".to_string()
            }
            .code(),
            2001
        );
        assert_eq!(
            ConfigError::UnknownZeroNoisePolicy {
                name: "x".to_string()
            }
            .code(),
            2002
        );
        assert_eq!(
            ConfigError::InvalidBinEdges {
                reason: "x".to_string()
            }
            .code(),
            2003
        );
        assert_eq!(
            ConfigError::Parse {
                path: "x".to_string(),
                reason: "y".to_string()
            }
            .code(),
            2004
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::UnknownNoiseEstimator {
            name: "biweight".to_string(),
        };
        assert!(err.message().contains("biweight"));
        assert!(err.message().contains("sigma_clip or mad"));
    }
}
