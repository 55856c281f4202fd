// Astro SNR Core - per-image signal-to-noise estimation
// Mask aggregation, background noise, peak flux and SNR binning for labelled sky images

// Module declarations
pub mod analysis;
pub mod batch;
pub mod config;
pub mod error;
pub mod loader;
pub mod report;
pub mod testing;

// Re-exports for convenience
pub use analysis::{
    BeamGeometry, ClassificationTables, CombinedMask, Image, MaskAggregator, NoiseEstimator,
    ObjectMask, ResultClassifier, Sample, SnrPipeline, SnrRecord, SnrValue, ZeroNoisePolicy,
};
pub use batch::{BatchOutcome, BatchRunner};
pub use config::AppConfig;

/// Install the fmt subscriber used by the binaries.
///
/// `log` records emitted by the library are bridged into the subscriber. Output
/// goes to stderr so stdout stays free for reports. Calling this twice is a no-op.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
