//! Test and smoke-run helpers.
//!
//! Deterministic synthetic data shared by unit tests, integration tests and
//! the `synth` subcommand, so a full run can be exercised without a real
//! survey on disk.

pub mod synthetic;

pub use synthetic::{
    gaussian_noise_image, single_source_sample, write_dataset, SyntheticDataset,
};
