#![warn(missing_docs)]
//! benchrig Report - The Batch Report Sink
//!
//! Consumes the aggregator's read-only snapshot after the scheduler's
//! barrier returns and serializes it:
//! - CSV with a fixed superset column set, one row per discovered unit
//! - Auto-numbered report files (`prefix_1.csv`, `prefix_2.csv`, …) that
//!   never overwrite a prior run's output

mod csv;
mod naming;

pub use csv::generate_csv_report;
pub use naming::{next_report_path, write_csv_report};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Report sink failure. Results are already aggregated when this surfaces;
/// nothing about the batch itself is invalidated.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The output directory could not be created.
    #[error("failed to create report directory {}: {source}", .dir.display())]
    CreateDir {
        /// Directory being created.
        dir: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The report file could not be written.
    #[error("failed to write report {}: {source}", .path.display())]
    Write {
        /// Report location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}
