//! Configuration loading from benchrig.toml
//!
//! Harness configuration can be specified in a `benchrig.toml` file in the
//! project root. The file is discovered by walking up from the current
//! directory; CLI flags override anything loaded from it.

use std::path::Path;

use benchrig_core::ProbeKind;
use serde::{Deserialize, Serialize};

/// benchrig configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BenchrigConfig {
    /// Scheduler and probe configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// External compiler configuration
    #[serde(default)]
    pub toolchain: ToolchainSection,
    /// Synthetic dataset configuration
    #[serde(default)]
    pub dataset: DatasetSection,
    /// Report output configuration
    #[serde(default)]
    pub output: OutputSection,
}

/// Scheduler and probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Worker-pool size
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    /// Memory probe strategy: "polling", "self-rusage", or
    /// "external-profiler"
    #[serde(default)]
    pub probe: ProbeKind,
    /// Milliseconds between polling samples
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            probe: ProbeKind::default(),
            sample_interval_ms: default_sample_interval_ms(),
        }
    }
}

fn default_jobs() -> usize {
    benchrig_core::DEFAULT_WORKERS
}
fn default_sample_interval_ms() -> u64 {
    100
}

/// External compiler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainSection {
    /// Compiler binary
    #[serde(default = "default_compiler")]
    pub compiler: String,
    /// Extra compiler arguments placed before the source path
    #[serde(default)]
    pub args: Vec<String>,
    /// Extension benchmark units must carry
    #[serde(default = "default_unit_extension")]
    pub unit_extension: String,
}

impl Default for ToolchainSection {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            args: Vec::new(),
            unit_extension: default_unit_extension(),
        }
    }
}

fn default_compiler() -> String {
    "gcc".to_string()
}
fn default_unit_extension() -> String {
    "c".to_string()
}

/// Synthetic dataset settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSection {
    /// Number of elements to generate
    #[serde(default = "default_elements")]
    pub elements: u64,
    /// Dataset file path
    #[serde(default = "default_dataset_path")]
    pub path: String,
    /// Fixed seed for reproducible datasets
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for DatasetSection {
    fn default() -> Self {
        Self {
            elements: default_elements(),
            path: default_dataset_path(),
            seed: None,
        }
    }
}

fn default_elements() -> u64 {
    10_000
}
fn default_dataset_path() -> String {
    "data/dataset.bin".to_string()
}

/// Report output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    /// Output directory for reports
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Report file name prefix
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            prefix: default_prefix(),
        }
    }
}

fn default_output_dir() -> String {
    "results".to_string()
}
fn default_prefix() -> String {
    "results".to_string()
}

impl BenchrigConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from the
    /// current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("benchrig.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# benchrig Configuration

[runner]
# Worker-pool size
jobs = 8
# Memory probe: "polling", "self-rusage", or "external-profiler"
probe = "polling"
# Milliseconds between polling samples
sample_interval_ms = 100

[toolchain]
# External compiler, invoked as: <compiler> [args..] <source> -o <output>
compiler = "gcc"
# Extra compiler arguments (uncomment to enable)
# args = ["-O2"]
# Extension benchmark units must carry
unit_extension = "c"

[dataset]
# Elements written to the dataset file before scheduling
elements = 10000
# Dataset file path (unit programs read it by convention)
path = "data/dataset.bin"
# Fixed seed for reproducible datasets (uncomment to enable)
# seed = 42

[output]
# Report directory; files are auto-numbered and never overwritten
directory = "results"
# Report file name prefix
prefix = "results"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BenchrigConfig::default();
        assert_eq!(config.runner.jobs, 8);
        assert_eq!(config.runner.probe, ProbeKind::Polling);
        assert_eq!(config.runner.sample_interval_ms, 100);
        assert_eq!(config.toolchain.compiler, "gcc");
        assert_eq!(config.dataset.elements, 10_000);
        assert_eq!(config.output.directory, "results");
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [runner]
            jobs = 2
            probe = "external-profiler"

            [toolchain]
            compiler = "clang"
            args = ["-O3", "-march=native"]
        "#;

        let config: BenchrigConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.jobs, 2);
        assert_eq!(config.runner.probe, ProbeKind::ExternalProfiler);
        assert_eq!(config.toolchain.compiler, "clang");
        assert_eq!(config.toolchain.args, ["-O3", "-march=native"]);
        // Defaults should still apply
        assert_eq!(config.runner.sample_interval_ms, 100);
        assert_eq!(config.output.prefix, "results");
    }

    #[test]
    fn test_default_toml_parses() {
        let default_toml = BenchrigConfig::default_toml();
        let config: BenchrigConfig = toml::from_str(&default_toml).unwrap();
        assert_eq!(config.runner.jobs, 8);
        assert_eq!(config.dataset.path, "data/dataset.bin");
    }
}
