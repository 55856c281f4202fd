use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use astro_snr::analysis::{NoiseEstimator, ZeroNoisePolicy};
use astro_snr::batch::BatchRunner;
use astro_snr::config::AppConfig;
use astro_snr::error::{log_config_error, ConfigError};
use astro_snr::loader::{read_sample_list, JsonArraySource, SampleLoader};
use astro_snr::report::ReportWriter;
use astro_snr::testing::{write_dataset, SyntheticDataset};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "astro_snr",
    about = "Per-image signal-to-noise estimation for labelled sky images"
)]
struct Cli {
    /// Enable debug logging (per-sample noise, peak and SNR)
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute SNR for every sample in a sample list and write reports
    Run(RunArgs),
    /// Write a deterministic synthetic dataset and its sample list
    Synth(SynthArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// File listing one label JSON path per line
    #[arg(long)]
    sample_list: PathBuf,
    /// JSON configuration file (missing file means defaults)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(flatten)]
    estimator: EstimatorArgs,
    /// What to do with samples whose background noise is zero
    #[arg(long, value_enum)]
    zero_noise: Option<ZeroNoiseArg>,
    /// Worker threads for per-sample processing
    #[arg(long)]
    workers: Option<usize>,
    /// Directory receiving the report files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Args, Debug)]
#[group(multiple = false)]
struct EstimatorArgs {
    /// Estimate background noise with iterative 3-sigma clipping (default)
    #[arg(long = "3sigma-clip")]
    sigma_clip: bool,
    /// Estimate background noise with the median absolute deviation
    #[arg(long)]
    mad: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ZeroNoiseArg {
    Exclude,
    Unbounded,
}

impl From<ZeroNoiseArg> for ZeroNoisePolicy {
    fn from(arg: ZeroNoiseArg) -> Self {
        match arg {
            ZeroNoiseArg::Exclude => ZeroNoisePolicy::Exclude,
            ZeroNoiseArg::Unbounded => ZeroNoisePolicy::Unbounded,
        }
    }
}

#[derive(Args, Debug)]
struct SynthArgs {
    /// Directory receiving the dataset
    #[arg(long)]
    output_dir: PathBuf,
    #[arg(long, default_value_t = 16)]
    samples: usize,
    /// Image side length in pixels
    #[arg(long, default_value_t = 64)]
    size: usize,
    /// Background standard deviation
    #[arg(long, default_value_t = 1.0)]
    sigma: f64,
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    astro_snr::init_logging(cli.verbose);

    match cli.command {
        Commands::Run(args) => run_pipeline(args),
        Commands::Synth(args) => run_synth(args),
    }
}

fn run_pipeline(args: RunArgs) -> Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path).map_err(|err| fatal(err, "loading config"))?,
        None => AppConfig::default(),
    };
    apply_overrides(&mut config, &args);

    let resolved = config
        .validate()
        .map_err(|err| fatal(err, "validating config"))?;
    let estimator: NoiseEstimator = resolved.estimator;
    println!("Using {} for Background Noise Estimation.", estimator);

    let labels = read_sample_list(&args.sample_list, config.dataset.path_rewrite.as_ref())?;

    let loader = SampleLoader::new(JsonArraySource)
        .with_output_root_marker(config.dataset.output_root_marker.clone());
    let mut runner = BatchRunner::new(loader, resolved.pipeline(), resolved.classifier.clone())
        .with_log_every_n(config.pipeline.log_every_n_samples);
    if let Some(workers) = config.pipeline.workers {
        runner = runner.with_workers(workers)?;
    }

    let outcome = runner.run_labels(&labels);

    for bin in &outcome.tables.coarse {
        println!("Images with an SNR {}: {}", bin.label, bin.count);
    }
    if !outcome.failures.is_empty() {
        println!("Skipped {} of {} samples", outcome.failures.len(), labels.len());
    }

    let written = ReportWriter::new(&args.output_dir)
        .write(&outcome)
        .with_context(|| format!("writing reports to {}", args.output_dir.display()))?;
    println!(
        "Wrote {} report files to {}",
        written.len(),
        args.output_dir.display()
    );

    Ok(ExitCode::from(0))
}

fn apply_overrides(config: &mut AppConfig, args: &RunArgs) {
    if args.estimator.sigma_clip {
        config.noise.estimator = "sigma_clip".to_string();
    } else if args.estimator.mad {
        config.noise.estimator = "mad".to_string();
    }
    if let Some(policy) = args.zero_noise {
        config.snr.zero_noise_policy = ZeroNoisePolicy::from(policy).name().to_string();
    }
    if args.workers.is_some() {
        config.pipeline.workers = args.workers;
    }
}

fn fatal(err: ConfigError, context: &str) -> anyhow::Error {
    log_config_error(&err, context);
    anyhow::Error::new(err).context(context.to_string())
}

fn run_synth(args: SynthArgs) -> Result<ExitCode> {
    let dataset = SyntheticDataset {
        size: args.size,
        sigma: args.sigma,
        seed: args.seed,
        ..SyntheticDataset::default()
    };
    let list = write_dataset(&args.output_dir, args.samples, &dataset)?;
    println!("{}", list.display());
    Ok(ExitCode::from(0))
}
