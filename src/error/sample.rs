// Per-sample error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Sample error code constants
///
/// Error code range: 1001-1007
pub struct SampleErrorCodes {}

impl SampleErrorCodes {
    /// Image source not found on disk
    pub const MISSING_IMAGE: i32 = 1001;

    /// Mask and image grids disagree
    pub const SHAPE_MISMATCH: i32 = 1002;

    /// No usable background pixels remain after masking
    pub const EMPTY_BACKGROUND: i32 = 1003;

    /// No usable object pixels to take a peak from
    pub const UNDEFINED_PEAK_FLUX: i32 = 1004;

    /// Background noise is zero so the ratio is undefined
    pub const ZERO_NOISE: i32 = 1005;

    /// Beam geometry cannot produce a beam area
    pub const INVALID_BEAM_GEOMETRY: i32 = 1006;

    /// Label, image or mask could not be read or decoded
    pub const LOAD_FAILED: i32 = 1007;
}

/// Log a sample error with structured context
///
/// The sample identifier goes first so failures can be grepped per sample.
pub fn log_sample_error(err: &SampleError, identifier: &str) {
    error!(
        "Sample error for {}: code={}, component=SnrPipeline, message={}",
        identifier,
        err.code(),
        err.message()
    );
}

/// Per-sample errors
///
/// Any of these excludes the sample from the record set and from every
/// classification view. None of them stops the batch.
///
/// Error code range: 1001-1007
#[derive(Debug, Clone, PartialEq)]
pub enum SampleError {
    /// Image file referenced by the label is absent
    MissingImage { path: String },

    /// A mask grid does not match the image grid (rows, cols)
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Every pixel is an object pixel or non-finite
    EmptyBackground,

    /// The combined mask selects no finite pixel
    UndefinedPeakFlux,

    /// Background noise is zero and the policy excludes such samples
    ZeroNoise { peak_flux: f64 },

    /// Beam geometry scalars are zero or non-finite
    InvalidBeamGeometry { reason: String },

    /// Label, image or mask could not be read
    LoadFailed { path: String, reason: String },
}

impl ErrorCode for SampleError {
    fn code(&self) -> i32 {
        match self {
            SampleError::MissingImage { .. } => SampleErrorCodes::MISSING_IMAGE,
            SampleError::ShapeMismatch { .. } => SampleErrorCodes::SHAPE_MISMATCH,
            SampleError::EmptyBackground => SampleErrorCodes::EMPTY_BACKGROUND,
            SampleError::UndefinedPeakFlux => SampleErrorCodes::UNDEFINED_PEAK_FLUX,
            SampleError::ZeroNoise { .. } => SampleErrorCodes::ZERO_NOISE,
            SampleError::InvalidBeamGeometry { .. } => SampleErrorCodes::INVALID_BEAM_GEOMETRY,
            SampleError::LoadFailed { .. } => SampleErrorCodes::LOAD_FAILED,
        }
    }

    fn message(&self) -> String {
        match self {
            SampleError::MissingImage { path } => {
                format!("File {} not found on disk", path)
            }
            SampleError::ShapeMismatch { expected, found } => {
                format!(
                    "Mask shape {}x{} does not match image shape {}x{}",
                    found.0, found.1, expected.0, expected.1
                )
            }
            SampleError::EmptyBackground => {
                "No background pixels left to estimate noise from".to_string()
            }
            SampleError::UndefinedPeakFlux => {
                "Peak flux undefined: combined mask selects no object pixels".to_string()
            }
            SampleError::ZeroNoise { peak_flux } => {
                format!(
                    "Background noise is zero (peak flux {}), SNR undefined",
                    peak_flux
                )
            }
            SampleError::InvalidBeamGeometry { reason } => {
                format!("Invalid beam geometry: {}", reason)
            }
            SampleError::LoadFailed { path, reason } => {
                format!("Failed to load {}: {}", path, reason)
            }
        }
    }
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SampleError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for SampleError {}
