// SNR module - peak flux over background noise

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::types::SnrValue;
use crate::error::{ConfigError, SampleError};

/// What to do when the background noise is zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroNoisePolicy {
    /// Drop the sample with [`SampleError::ZeroNoise`]
    #[default]
    Exclude,
    /// Keep the sample as [`SnrValue::Unbounded`] when its peak is positive
    Unbounded,
}

impl ZeroNoisePolicy {
    pub fn name(&self) -> &'static str {
        match self {
            ZeroNoisePolicy::Exclude => "exclude",
            ZeroNoisePolicy::Unbounded => "unbounded",
        }
    }
}

impl FromStr for ZeroNoisePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exclude" => Ok(ZeroNoisePolicy::Exclude),
            "unbounded" => Ok(ZeroNoisePolicy::Unbounded),
            _ => Err(ConfigError::UnknownZeroNoisePolicy {
                name: s.to_string(),
            }),
        }
    }
}

/// `peak_flux / background_noise`
///
/// A zero or non-finite noise never yields a silent `inf`/`NaN`: it is either
/// an error or an explicit [`SnrValue::Unbounded`], depending on `policy`.
/// A non-positive peak over zero noise has no meaningful ratio and is always
/// rejected.
pub fn compute_snr(
    peak_flux: f64,
    background_noise: f64,
    policy: ZeroNoisePolicy,
) -> Result<SnrValue, SampleError> {
    if !peak_flux.is_finite() {
        return Err(SampleError::UndefinedPeakFlux);
    }

    let ratio = peak_flux / background_noise;
    if background_noise != 0.0 && ratio.is_finite() {
        return Ok(SnrValue::Finite(ratio));
    }

    match policy {
        ZeroNoisePolicy::Unbounded if peak_flux > 0.0 => Ok(SnrValue::Unbounded),
        _ => Err(SampleError::ZeroNoise { peak_flux }),
    }
}
