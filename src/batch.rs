// Batch module - runs the pipeline over a whole sample list
//
// Per-sample work (load + process) runs on a rayon pool; results are collected
// back in input order, then classification runs once, sequentially, over the
// successful records. A failing sample is logged and recorded, never fatal.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;

use crate::analysis::{
    BinCount, ClassificationTables, ResultClassifier, Sample, SnrPipeline, SnrRecord,
};
use crate::error::{log_sample_error, ErrorCode, SampleError};
use crate::loader::{PixelSource, SampleLoader};

/// A sample that did not produce a record
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFailure {
    pub identifier: String,
    pub error: SampleError,
}

impl SampleFailure {
    /// Structured form used in `summary.json`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "identifier": self.identifier,
            "code": self.error.code(),
            "message": self.error.message(),
        })
    }
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Successful records in sample-list order
    pub records: Vec<SnrRecord>,
    /// Failed samples in sample-list order
    pub failures: Vec<SampleFailure>,
    pub tables: ClassificationTables,
    /// Name of the noise estimator used
    pub estimator: String,
}

/// Totals reported at the end of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub processed: usize,
    pub failed: usize,
    pub estimator: String,
    pub coarse: Vec<BinCount>,
    pub failures: Vec<serde_json::Value>,
}

impl BatchOutcome {
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            total: self.records.len() + self.failures.len(),
            processed: self.records.len(),
            failed: self.failures.len(),
            estimator: self.estimator.clone(),
            coarse: self.tables.coarse.clone(),
            failures: self.failures.iter().map(SampleFailure::to_json).collect(),
        }
    }
}

/// Loader, pipeline and classifier wired together
pub struct BatchRunner<S: PixelSource> {
    loader: SampleLoader<S>,
    pipeline: SnrPipeline,
    classifier: ResultClassifier,
    thread_pool: Option<Arc<rayon::ThreadPool>>,
    log_every_n: usize,
}

impl<S: PixelSource> BatchRunner<S> {
    pub fn new(loader: SampleLoader<S>, pipeline: SnrPipeline, classifier: ResultClassifier) -> Self {
        Self {
            loader,
            pipeline,
            classifier,
            thread_pool: None,
            log_every_n: 100,
        }
    }

    /// Run per-sample work on a dedicated pool of `workers` threads
    pub fn with_workers(mut self, workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("snr-worker-{i}"))
            .build()
            .context("Failed to build worker pool")?;
        self.thread_pool = Some(Arc::new(pool));
        Ok(self)
    }

    pub fn with_log_every_n(mut self, n: usize) -> Self {
        self.log_every_n = n.max(1);
        self
    }

    /// Load and process every label, then classify
    pub fn run_labels(&self, labels: &[PathBuf]) -> BatchOutcome {
        log::info!(
            "[Pipeline] Processing {} samples with {} noise estimation",
            labels.len(),
            self.pipeline.estimator()
        );
        let progress = AtomicUsize::new(0);
        let total = labels.len();

        let results = self.install(|| {
            labels
                .par_iter()
                .map(|label| {
                    let result = self
                        .loader
                        .load(label)
                        .and_then(|sample| self.pipeline.process(&sample));
                    self.tick(&progress, total);
                    (label_identifier(label), result)
                })
                .collect::<Vec<_>>()
        });

        self.finish(results)
    }

    /// Process already-loaded samples, then classify
    pub fn run_samples(&self, samples: &[Sample]) -> BatchOutcome {
        let progress = AtomicUsize::new(0);
        let total = samples.len();

        let results = self.install(|| {
            samples
                .par_iter()
                .map(|sample| {
                    let result = self.pipeline.process(sample);
                    self.tick(&progress, total);
                    (sample.identifier.clone(), result)
                })
                .collect::<Vec<_>>()
        });

        self.finish(results)
    }

    fn install<R: Send>(&self, work: impl FnOnce() -> R + Send) -> R {
        match &self.thread_pool {
            Some(pool) => pool.install(work),
            None => work(),
        }
    }

    fn tick(&self, progress: &AtomicUsize, total: usize) {
        let done = progress.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.log_every_n == 0 || done == total {
            log::info!("[Pipeline] Processed {}/{} samples", done, total);
        }
    }

    fn finish(&self, results: Vec<(String, Result<SnrRecord, SampleError>)>) -> BatchOutcome {
        let mut records = Vec::with_capacity(results.len());
        let mut failures = Vec::new();

        for (identifier, result) in results {
            match result {
                Ok(record) => records.push(record),
                Err(error) => {
                    log_sample_error(&error, &identifier);
                    failures.push(SampleFailure { identifier, error });
                }
            }
        }

        let tables = self.classifier.classify(&records);
        log::info!(
            "[Pipeline] Finished: {} processed, {} skipped",
            records.len(),
            failures.len()
        );

        BatchOutcome {
            records,
            failures,
            tables,
            estimator: self.pipeline.estimator().name().to_string(),
        }
    }
}

fn label_identifier(label: &Path) -> String {
    label.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{NoiseEstimator, ObjectMask, SnrValue, ZeroNoisePolicy};
    use crate::loader::JsonArraySource;
    use crate::testing::synthetic::single_source_sample;
    use ndarray::Array2;

    fn runner() -> BatchRunner<JsonArraySource> {
        BatchRunner::new(
            SampleLoader::new(JsonArraySource),
            SnrPipeline::default(),
            ResultClassifier::default(),
        )
    }

    fn flat_sample(id: &str) -> Sample {
        let mut image = Array2::from_elem((10, 10), 1.0);
        image[(5, 5)] = 5.0;
        let mut pixels = Array2::from_elem((10, 10), false);
        pixels[(5, 5)] = true;
        Sample::new(id, image).with_mask(ObjectMask::from_pixels(pixels))
    }

    #[test]
    fn test_failures_do_not_stop_the_batch() {
        let samples = vec![
            single_source_sample("ok-1", 32, 1.0, 3.0, 1),
            flat_sample("flat"),
            Sample::new("unmasked", Array2::from_elem((4, 4), 1.0)),
            single_source_sample("ok-2", 32, 1.0, 30.0, 2),
        ];
        let outcome = runner().run_samples(&samples);

        let ids: Vec<&str> = outcome
            .records
            .iter()
            .map(|r| r.sample_identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["ok-1", "ok-2"]);

        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(outcome.failures[0].identifier, "flat");
        assert_eq!(outcome.failures[1].error, SampleError::UndefinedPeakFlux);

        // failed samples are absent from every view
        assert_eq!(outcome.tables.classified_count(), 2);
        let summary = outcome.summary();
        assert_eq!((summary.total, summary.processed, summary.failed), (4, 2, 2));
        assert_eq!(summary.failures[0]["code"], 1005);
    }

    #[test]
    fn test_unbounded_policy_keeps_zero_noise_samples() {
        let runner = BatchRunner::new(
            SampleLoader::new(JsonArraySource),
            SnrPipeline::new(NoiseEstimator::default(), ZeroNoisePolicy::Unbounded),
            ResultClassifier::default(),
        );
        let outcome = runner.run_samples(&[flat_sample("flat")]);

        assert_eq!(outcome.records[0].snr, SnrValue::Unbounded);
        assert_eq!(outcome.tables.fine_bin("200+").unwrap().members, vec!["flat"]);
        assert_eq!(outcome.tables.thresholds.at_or_above_high, vec!["flat"]);
    }

    #[test]
    fn test_dedicated_pool_matches_global_pool() {
        let samples: Vec<Sample> = (0..12)
            .map(|i| single_source_sample(format!("s{i}"), 24, 1.0, 2.0 + i as f64 * 5.0, i))
            .collect();

        let global = runner().run_samples(&samples);
        let pooled = runner()
            .with_workers(3)
            .unwrap()
            .with_log_every_n(5)
            .run_samples(&samples);

        assert_eq!(global.records, pooled.records);
        assert_eq!(global.tables, pooled.tables);
        assert_eq!(pooled.estimator, "sigma_clip");
    }

    #[test]
    fn test_unreadable_labels_are_failures() {
        let labels = vec![PathBuf::from("/nonexistent/s1/labels/a.json")];
        let outcome = runner().run_labels(&labels);

        assert!(outcome.records.is_empty());
        assert!(matches!(
            outcome.failures[0].error,
            SampleError::LoadFailed { .. }
        ));
        assert_eq!(outcome.tables.classified_count(), 0);
    }
}
