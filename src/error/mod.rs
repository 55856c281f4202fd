// Error types for the SNR pipeline
//
// Per-sample failures (SampleError) are local: the sample is logged and excluded.
// Configuration failures (ConfigError) are global and stop the run at startup.

mod config;
mod sample;

pub use config::{log_config_error, ConfigError, ConfigErrorCodes};
pub use sample::{log_sample_error, SampleError, SampleErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, so reports and logs can carry a stable
/// numeric code next to the human-readable text.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
