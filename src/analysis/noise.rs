// Noise module - background noise estimation
//
// The background population is every finite pixel outside the combined mask.
// Object pixels never enter the statistic: the estimate characterises sky and
// detector noise, not source flux.
//
// Strategies:
// - SigmaClip: iterative 3-sigma clipping around the median, clipped std
// - Mad: median absolute deviation scaled to standard-deviation units

use std::fmt;
use std::str::FromStr;

use super::mask::CombinedMask;
use super::stats::{self, ClippedStats};
use super::types::Image;
use crate::error::{ConfigError, SampleError};

/// Scale factor turning a MAD into a Gaussian-equivalent standard deviation
pub const MAD_TO_SIGMA: f64 = 1.4826;

/// Clipping threshold in standard deviations
pub const DEFAULT_CLIP_SIGMA: f64 = 3.0;

/// Clipping passes before giving up on convergence
pub const DEFAULT_CLIP_MAX_ITERS: Option<usize> = Some(5);

/// Contract shared by every background statistic
pub trait NoiseStatistic {
    /// Noise in intensity units for a non-empty background population
    fn estimate_population(&self, background: Vec<f64>) -> Option<f64>;
}

/// Iterative sigma clipping; the clipped std is the noise
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SigmaClip {
    pub sigma: f64,
    pub max_iters: Option<usize>,
}

impl Default for SigmaClip {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_CLIP_SIGMA,
            max_iters: DEFAULT_CLIP_MAX_ITERS,
        }
    }
}

impl SigmaClip {
    /// Full clipped statistics (mean, median, std) of the population
    pub fn clipped_stats(&self, background: Vec<f64>) -> Option<ClippedStats> {
        stats::sigma_clipped_stats(background, self.sigma, self.max_iters)
    }
}

impl NoiseStatistic for SigmaClip {
    fn estimate_population(&self, background: Vec<f64>) -> Option<f64> {
        self.clipped_stats(background).map(|clipped| clipped.std)
    }
}

/// Median absolute deviation scaled by [`MAD_TO_SIGMA`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MedianAbsoluteDeviation;

impl NoiseStatistic for MedianAbsoluteDeviation {
    fn estimate_population(&self, mut background: Vec<f64>) -> Option<f64> {
        stats::median_absolute_deviation(&mut background).map(|mad| mad * MAD_TO_SIGMA)
    }
}

/// Background estimation strategy selected by configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoiseEstimator {
    SigmaClip(SigmaClip),
    Mad(MedianAbsoluteDeviation),
}

impl Default for NoiseEstimator {
    fn default() -> Self {
        NoiseEstimator::SigmaClip(SigmaClip::default())
    }
}

impl NoiseEstimator {
    pub fn sigma_clip(sigma: f64, max_iters: Option<usize>) -> Self {
        NoiseEstimator::SigmaClip(SigmaClip { sigma, max_iters })
    }

    pub fn mad() -> Self {
        NoiseEstimator::Mad(MedianAbsoluteDeviation)
    }

    /// Parse a strategy name, applying clip parameters to `sigma_clip`
    ///
    /// Accepts `sigma_clip` (or `3sigma_clip`) and `mad`. Anything else is a
    /// fatal configuration error.
    pub fn from_name(
        name: &str,
        sigma: f64,
        max_iters: Option<usize>,
    ) -> Result<Self, ConfigError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sigma_clip" | "3sigma_clip" => Ok(Self::sigma_clip(sigma, max_iters)),
            "mad" => Ok(Self::mad()),
            _ => Err(ConfigError::UnknownNoiseEstimator {
                name: name.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NoiseEstimator::SigmaClip(_) => "sigma_clip",
            NoiseEstimator::Mad(_) => "mad",
        }
    }

    /// Estimate background noise of `image` outside `mask`
    pub fn estimate(&self, image: &Image, mask: &CombinedMask) -> Result<f64, SampleError> {
        let background = mask.background_values(image)?;
        if background.is_empty() {
            return Err(SampleError::EmptyBackground);
        }

        let noise = match self {
            NoiseEstimator::SigmaClip(clip) => clip.estimate_population(background),
            NoiseEstimator::Mad(mad) => mad.estimate_population(background),
        };
        noise.ok_or(SampleError::EmptyBackground)
    }
}

impl FromStr for NoiseEstimator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s, DEFAULT_CLIP_SIGMA, DEFAULT_CLIP_MAX_ITERS)
    }
}

impl fmt::Display for NoiseEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoiseEstimator::SigmaClip(clip) => write!(f, "{}sigma_clip", clip.sigma),
            NoiseEstimator::Mad(_) => write!(f, "mad"),
        }
    }
}
