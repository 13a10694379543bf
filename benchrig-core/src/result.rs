//! Result data model for completed unit pipelines.

use std::fmt;
use std::time::Duration;

/// Terminal status of one unit's compile→run pipeline. Assigned exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Compiled and ran to a zero exit.
    Success,
    /// The external compiler exited nonzero; the run phase was skipped.
    CompilationFailed,
    /// The compiled artifact exited nonzero (or the run-phase probe failed).
    RuntimeFailed,
}

impl Status {
    /// Report-facing label for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Success => "Success",
            Status::CompilationFailed => "Compilation Failed",
            Status::RuntimeFailed => "Runtime Failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything measured for a single unit: one row of the final report.
///
/// Fields past the failing phase are zero/`None`, never fabricated. A record
/// is produced exactly once per unit and is immutable after insertion into
/// the aggregator.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Unit identifier (the source file name).
    pub unit: String,
    /// Size of the source file in bytes.
    pub source_size_bytes: u64,
    /// Size of the compiled artifact; `None` when compilation failed.
    pub artifact_size_bytes: Option<u64>,
    /// Wall-clock time of the compile phase.
    pub compile_time: Duration,
    /// Peak memory observed during the compile phase, in bytes.
    pub compile_peak_memory_bytes: u64,
    /// Wall-clock time of the run phase; zero when the run was skipped.
    pub run_time: Duration,
    /// Peak memory observed during the run phase, in bytes.
    pub run_peak_memory_bytes: u64,
    /// Terminal pipeline status.
    pub status: Status,
    /// Exit code of the run phase; `None` when the run never started.
    pub run_exit_code: Option<i32>,
    /// Captured diagnostic text for the failing phase; `None` on success.
    pub error: Option<String>,
    /// Element count of the dataset the unit ran against.
    pub dataset_elements: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_match_report_vocabulary() {
        assert_eq!(Status::Success.to_string(), "Success");
        assert_eq!(Status::CompilationFailed.to_string(), "Compilation Failed");
        assert_eq!(Status::RuntimeFailed.to_string(), "Runtime Failed");
    }
}
