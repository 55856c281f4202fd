// Analysis module - per-sample SNR pipeline
//
// This module turns one labelled image into one SNR record. Stages run in a
// fixed order and only depend on the sample they are given, so samples can be
// processed in any order or in parallel.
//
// Architecture:
// - MaskAggregator: object masks -> combined mask
// - NoiseEstimator: background population -> noise
// - Flux: object population -> peak (and integrated) flux
// - compute_snr: peak / noise under the zero-noise policy
// - ResultClassifier: all records -> coarse, threshold and fine views

pub mod classifier;
pub mod flux;
pub mod mask;
pub mod noise;
pub mod snr;
mod stats;
pub mod types;

pub use classifier::{
    BinCount, BinEdges, ClassificationTables, ResultClassifier, SnrBin, ThresholdManifests,
};
pub use flux::{measure_flux, peak_flux, BeamGeometry, FluxMeasurement};
pub use mask::{CombinedMask, MaskAggregator, ObjectMask};
pub use noise::{MedianAbsoluteDeviation, NoiseEstimator, NoiseStatistic, SigmaClip};
pub use snr::{compute_snr, ZeroNoisePolicy};
pub use stats::ClippedStats;
pub use types::{Image, Sample, SnrRecord, SnrValue};

use crate::error::SampleError;

/// Per-sample pipeline: combine masks, estimate noise, measure flux, divide
///
/// Holds no per-sample state; one instance is shared by every worker.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SnrPipeline {
    estimator: NoiseEstimator,
    zero_noise: ZeroNoisePolicy,
}

impl SnrPipeline {
    pub fn new(estimator: NoiseEstimator, zero_noise: ZeroNoisePolicy) -> Self {
        Self {
            estimator,
            zero_noise,
        }
    }

    pub fn estimator(&self) -> NoiseEstimator {
        self.estimator
    }

    pub fn zero_noise(&self) -> ZeroNoisePolicy {
        self.zero_noise
    }

    /// Run every stage for `sample`
    ///
    /// Failures carry the stage that rejected the sample; the caller decides
    /// whether to record and continue.
    pub fn process(&self, sample: &Sample) -> Result<SnrRecord, SampleError> {
        let combined = MaskAggregator::combine(sample.image.dim(), sample.masks.iter())?;
        let background_noise = self.estimator.estimate(&sample.image, &combined)?;
        let flux = measure_flux(&sample.image, &combined, sample.beam.as_ref())?;
        let snr = compute_snr(flux.peak_flux, background_noise, self.zero_noise)?;

        tracing::debug!(
            sample = %sample.identifier,
            objects = combined.object_count(),
            background = combined.background_count(),
            noise = background_noise,
            peak = flux.peak_flux,
            snr = %snr,
            "sample processed"
        );

        Ok(SnrRecord {
            sample_identifier: sample.identifier.clone(),
            image_key: sample.output_key().to_string(),
            background_noise,
            peak_flux: flux.peak_flux,
            integrated_flux: flux.integrated_flux,
            snr,
        })
    }
}
