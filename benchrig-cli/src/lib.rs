#![warn(missing_docs)]
//! benchrig CLI Library
//!
//! Wires the measured-execution engine to its collaborators: configuration
//! (`benchrig.toml` + CLI overrides), the one-shot dataset generation step,
//! progress reporting, and the CSV report sink.

mod config;

pub use config::*;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use benchrig_core::{
    discover_units, generate_dataset, BenchmarkUnit, DatasetConfig, ExecutionScheduler,
    ProbeKind, ResultAggregator, Status, ToolchainConfig, UnitPipeline,
};
use benchrig_report::write_csv_report;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use tracing::warn;

/// benchrig CLI arguments
#[derive(Parser, Debug)]
#[command(name = "benchrig")]
#[command(author, version, about = "benchrig - compile-and-run benchmark harness")]
pub struct Cli {
    /// Optional subcommand (List, Run); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Filter units by regex pattern
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Directory of benchmark source units
    #[arg(long, default_value = "algorithms")]
    pub units: PathBuf,

    /// Extension benchmark units must carry
    #[arg(long)]
    pub extension: Option<String>,

    /// Worker-pool size
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,

    /// Memory probe: polling, self-rusage, external-profiler
    #[arg(long)]
    pub probe: Option<String>,

    /// Milliseconds between polling samples
    #[arg(long)]
    pub sample_interval: Option<u64>,

    /// Compiler binary
    #[arg(long)]
    pub compiler: Option<String>,

    /// Dataset element count
    #[arg(long)]
    pub dataset_elements: Option<u64>,

    /// Dataset file path
    #[arg(long)]
    pub dataset_path: Option<PathBuf>,

    /// Fixed dataset seed for reproducible inputs
    #[arg(long)]
    pub dataset_seed: Option<u64>,

    /// Report output directory
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all discovered units
    List,
    /// Run the batch (default)
    Run,
}

/// Fully resolved run settings: `benchrig.toml` values with CLI overrides
/// applied on top.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Directory of benchmark source units.
    pub units_dir: PathBuf,
    /// Extension units must carry.
    pub unit_extension: String,
    /// Worker-pool size.
    pub jobs: usize,
    /// Selected memory probe strategy.
    pub probe_kind: ProbeKind,
    /// Interval between polling samples.
    pub sample_interval: Duration,
    /// External compiler settings.
    pub toolchain: ToolchainConfig,
    /// Dataset generation settings.
    pub dataset: DatasetConfig,
    /// Report output directory.
    pub output_dir: PathBuf,
    /// Report file name prefix.
    pub prefix: String,
}

impl RunSettings {
    /// Layer CLI flags over the discovered configuration.
    pub fn resolve(cli: &Cli, config: &BenchrigConfig) -> anyhow::Result<Self> {
        let probe_kind = match &cli.probe {
            Some(raw) => raw
                .parse::<ProbeKind>()
                .map_err(|e| anyhow::anyhow!("{e}"))?,
            None => config.runner.probe,
        };

        Ok(Self {
            units_dir: cli.units.clone(),
            unit_extension: cli
                .extension
                .clone()
                .unwrap_or_else(|| config.toolchain.unit_extension.clone()),
            jobs: cli.jobs.unwrap_or(config.runner.jobs).max(1),
            probe_kind,
            sample_interval: Duration::from_millis(
                cli.sample_interval.unwrap_or(config.runner.sample_interval_ms),
            ),
            toolchain: ToolchainConfig {
                compiler: cli
                    .compiler
                    .clone()
                    .unwrap_or_else(|| config.toolchain.compiler.clone()),
                extra_args: config.toolchain.args.clone(),
            },
            dataset: DatasetConfig {
                path: cli
                    .dataset_path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(&config.dataset.path)),
                elements: cli.dataset_elements.unwrap_or(config.dataset.elements),
                seed: cli.dataset_seed.or(config.dataset.seed),
            },
            output_dir: cli
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.output.directory)),
            prefix: config.output.prefix.clone(),
        })
    }
}

/// Run the benchrig CLI with the given arguments.
/// This is the main entry point for the `benchrig` binary.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the benchrig CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("benchrig=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("benchrig=info")
            .init();
    }

    // Discover benchrig.toml configuration (CLI flags override)
    let config = BenchrigConfig::discover().unwrap_or_default();
    let settings = RunSettings::resolve(&cli, &config)?;

    match cli.command {
        Some(Commands::List) => list_units(&cli, &settings),
        Some(Commands::Run) | None => run_batch(&cli, &settings),
    }
}

/// Keep units whose id matches the CLI filter pattern.
fn filter_units(units: Vec<BenchmarkUnit>, pattern: &str) -> Vec<BenchmarkUnit> {
    match Regex::new(pattern) {
        Ok(re) => units.into_iter().filter(|u| re.is_match(&u.id)).collect(),
        Err(e) => {
            warn!(pattern, error = %e, "invalid filter pattern; keeping all units");
            units
        }
    }
}

fn list_units(cli: &Cli, settings: &RunSettings) -> anyhow::Result<()> {
    let units = discover_units(&settings.units_dir, &settings.unit_extension)
        .context("unit discovery failed")?;
    let units = filter_units(units, &cli.filter);

    println!("benchrig Plan:");
    for unit in &units {
        println!("├── {} ({} bytes)", unit.id, unit.source_size_bytes);
    }
    println!("{} units found.", units.len());
    Ok(())
}

fn run_batch(cli: &Cli, settings: &RunSettings) -> anyhow::Result<()> {
    let units = discover_units(&settings.units_dir, &settings.unit_extension)
        .context("unit discovery failed")?;
    let units = filter_units(units, &cli.filter);

    if units.is_empty() {
        println!("No units found.");
        return Ok(());
    }

    // The dataset is generated exactly once, before any concurrent work.
    generate_dataset(&settings.dataset).context("dataset generation failed")?;

    let probe = settings.probe_kind.build(settings.sample_interval);
    let pipeline = UnitPipeline::new(&settings.toolchain, probe.as_ref(), settings.dataset.elements);
    let aggregator = ResultAggregator::new();
    let scheduler = ExecutionScheduler::new(settings.jobs);

    println!(
        "Running {} units, {} worker(s), {} probe...\n",
        units.len(),
        settings.jobs,
        probe.name()
    );

    let start_time = Instant::now();
    let pb = ProgressBar::new(units.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    scheduler.run_batch(&units, &pipeline, &aggregator, |result| {
        pb.set_message(result.unit.clone());
        pb.inc(1);
    })?;
    pb.finish_with_message("Complete");

    let results = aggregator.snapshot();
    if results.len() != units.len() {
        warn!(
            expected = units.len(),
            collected = results.len(),
            "result count does not match discovered units"
        );
    }

    let report_path = write_csv_report(&settings.output_dir, &settings.prefix, &results)?;

    let succeeded = results.iter().filter(|r| r.status == Status::Success).count();
    let compile_failed = results
        .iter()
        .filter(|r| r.status == Status::CompilationFailed)
        .count();
    let run_failed = results
        .iter()
        .filter(|r| r.status == Status::RuntimeFailed)
        .count();

    println!(
        "\n{} succeeded, {} failed to compile, {} failed at runtime ({:.1}s total)",
        succeeded,
        compile_failed,
        run_failed,
        start_time.elapsed().as_secs_f64()
    );
    println!("Report written to: {}", report_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("benchrig").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_overrides_win_over_config() {
        let cli = parse(&[
            "--jobs",
            "3",
            "--probe",
            "self-rusage",
            "--compiler",
            "clang",
            "--dataset-elements",
            "77",
        ]);
        let config = BenchrigConfig::default();
        let settings = RunSettings::resolve(&cli, &config).unwrap();

        assert_eq!(settings.jobs, 3);
        assert_eq!(settings.probe_kind, ProbeKind::SelfRusage);
        assert_eq!(settings.toolchain.compiler, "clang");
        assert_eq!(settings.dataset.elements, 77);
    }

    #[test]
    fn config_values_apply_when_cli_is_silent() {
        let cli = parse(&[]);
        let config: BenchrigConfig = toml::from_str(
            r#"
            [runner]
            jobs = 2
            probe = "external-profiler"
            sample_interval_ms = 25

            [output]
            directory = "reports"
            prefix = "bench"
        "#,
        )
        .unwrap();
        let settings = RunSettings::resolve(&cli, &config).unwrap();

        assert_eq!(settings.jobs, 2);
        assert_eq!(settings.probe_kind, ProbeKind::ExternalProfiler);
        assert_eq!(settings.sample_interval, Duration::from_millis(25));
        assert_eq!(settings.output_dir, PathBuf::from("reports"));
        assert_eq!(settings.prefix, "bench");
    }

    #[test]
    fn unknown_probe_is_rejected() {
        let cli = parse(&["--probe", "psutil"]);
        let config = BenchrigConfig::default();
        assert!(RunSettings::resolve(&cli, &config).is_err());
    }

    #[test]
    fn filter_keeps_matching_units() {
        let units = vec![
            BenchmarkUnit {
                id: "mergeSort.c".to_string(),
                source_path: PathBuf::from("a/mergeSort.c"),
                source_size_bytes: 1,
            },
            BenchmarkUnit {
                id: "quickSort.c".to_string(),
                source_path: PathBuf::from("a/quickSort.c"),
                source_size_bytes: 1,
            },
        ];
        let kept = filter_units(units, "quick");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "quickSort.c");
    }
}
