//! Memory measurement strategies.
//!
//! A [`MemoryProbe`] runs one command to completion and reports its wall
//! time, exit code, and a peak-resident-memory figure. Exactly one strategy
//! is bound per deployment via [`ProbeKind::build`]; the pipeline and
//! scheduler stay probe-agnostic behind the trait.

mod polling;
mod profiler;
mod rusage;

pub use polling::PollingProbe;
pub use profiler::ProfilerProbe;
pub use rusage::SelfRusageProbe;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::execution::{ExecOutcome, ExecRequest};

/// Errors a probe can surface. These are unit-local: the pipeline folds them
/// into the unit's result and the batch proceeds.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The command (or the wrapping profiler) could not be spawned.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The profiler report was still missing after the bounded retries.
    #[error("profiler report {} missing after {attempts} attempt(s)", .path.display())]
    ReportMissing {
        /// Expected report location.
        path: PathBuf,
        /// How many wrapped runs were attempted.
        attempts: u32,
    },

    /// The profiler report exists but could not be read.
    #[error("failed to read profiler report {}: {source}", .path.display())]
    ReportUnreadable {
        /// Report location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl ProbeError {
    pub(crate) fn spawn(request: &ExecRequest, source: io::Error) -> Self {
        ProbeError::Spawn {
            program: request.program.display().to_string(),
            source,
        }
    }
}

/// Strategy interface: obtain peak resident memory for one full child
/// lifetime, alongside the timing and exit data of the execution.
pub trait MemoryProbe: Send + Sync {
    /// Short strategy name used in logs and the run summary.
    fn name(&self) -> &'static str;

    /// Run `request` to completion, measuring wall time and peak memory.
    /// A nonzero child exit is reported in the outcome, not as an error.
    fn measure(&self, request: &ExecRequest) -> Result<ExecOutcome, ProbeError>;
}

/// Which memory-measurement strategy a deployment binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeKind {
    /// Sample the child's resident set at a fixed interval (default).
    #[default]
    Polling,
    /// Delta of the harness's own `ru_maxrss` around the child's lifetime.
    SelfRusage,
    /// Re-run the command under an external heap profiler and parse its
    /// report.
    ExternalProfiler,
}

impl ProbeKind {
    /// Build the configured strategy. Selected once at startup; call sites
    /// never branch on the kind again.
    pub fn build(self, sample_interval: Duration) -> Box<dyn MemoryProbe> {
        match self {
            ProbeKind::Polling => Box::new(PollingProbe::new(sample_interval)),
            ProbeKind::SelfRusage => Box::new(SelfRusageProbe::new()),
            ProbeKind::ExternalProfiler => Box::new(ProfilerProbe::new("valgrind")),
        }
    }
}

impl std::str::FromStr for ProbeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "polling" => Ok(ProbeKind::Polling),
            "self-rusage" => Ok(ProbeKind::SelfRusage),
            "external-profiler" => Ok(ProbeKind::ExternalProfiler),
            other => Err(format!("Unknown probe strategy: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_kind_parses_kebab_case() {
        assert_eq!("polling".parse::<ProbeKind>().unwrap(), ProbeKind::Polling);
        assert_eq!(
            "self-rusage".parse::<ProbeKind>().unwrap(),
            ProbeKind::SelfRusage
        );
        assert_eq!(
            "external-profiler".parse::<ProbeKind>().unwrap(),
            ProbeKind::ExternalProfiler
        );
        assert!("massif".parse::<ProbeKind>().is_err());
    }

    #[test]
    fn build_binds_the_selected_strategy() {
        let probe = ProbeKind::Polling.build(Duration::from_millis(100));
        assert_eq!(probe.name(), "polling");
        let probe = ProbeKind::SelfRusage.build(Duration::from_millis(100));
        assert_eq!(probe.name(), "self-rusage");
        let probe = ProbeKind::ExternalProfiler.build(Duration::from_millis(100));
        assert_eq!(probe.name(), "external-profiler");
    }
}
