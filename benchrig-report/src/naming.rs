//! Auto-numbered report file naming.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use benchrig_core::ExecutionResult;
use tracing::info;

use crate::csv::generate_csv_report;
use crate::ReportError;

/// First `<prefix>_<n>.csv` (n counting from 1) not present in `dir`.
/// Consecutive runs against the same directory therefore produce sequential
/// file names.
pub fn next_report_path(dir: &Path, prefix: &str) -> PathBuf {
    let mut n: u64 = 1;
    loop {
        let candidate = dir.join(format!("{prefix}_{n}.csv"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Serialize `results` into the next free report slot under `dir`, creating
/// the directory if needed. The file is opened with `create_new`, so an
/// existing report is never overwritten even when two harness runs race for
/// the same slot.
pub fn write_csv_report(
    dir: &Path,
    prefix: &str,
    results: &[ExecutionResult],
) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir).map_err(|source| ReportError::CreateDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let contents = generate_csv_report(results);
    let mut n: u64 = 1;
    loop {
        let candidate = dir.join(format!("{prefix}_{n}.csv"));
        match File::options().write(true).create_new(true).open(&candidate) {
            Ok(mut file) => {
                file.write_all(contents.as_bytes())
                    .map_err(|source| ReportError::Write {
                        path: candidate.clone(),
                        source,
                    })?;
                info!(path = %candidate.display(), rows = results.len(), "report written");
                return Ok(candidate);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                n += 1;
            }
            Err(source) => {
                return Err(ReportError::Write {
                    path: candidate,
                    source,
                });
            }
        }
    }
}
