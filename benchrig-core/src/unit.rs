//! Benchmark unit discovery.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Failure to enumerate benchmark units. Fatal to the whole run: with no
/// units there is nothing to schedule and no results can be produced.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The input location could not be listed.
    #[error("failed to read unit directory {}: {source}", .dir.display())]
    Unreadable {
        /// The directory that was being listed.
        dir: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A directory entry's metadata could not be read.
    #[error("failed to stat unit {}: {source}", .path.display())]
    Metadata {
        /// The entry that could not be stat'ed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// One source program to be compiled, run, and measured.
///
/// Immutable once discovered; owned by the scheduler for the duration of its
/// pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkUnit {
    /// Identifier derived from the source file name.
    pub id: String,
    /// Path to the source file.
    pub source_path: PathBuf,
    /// Size of the source file in bytes.
    pub source_size_bytes: u64,
}

/// Enumerate benchmark units in `dir` carrying `extension`.
///
/// The returned sequence is sorted lexicographically by unit id, so repeated
/// discovery on an unchanged directory yields an identical ordering
/// regardless of filesystem iteration order. Non-files and other extensions
/// are skipped.
pub fn discover_units(dir: &Path, extension: &str) -> Result<Vec<BenchmarkUnit>, DiscoveryError> {
    let entries = fs::read_dir(dir).map_err(|source| DiscoveryError::Unreadable {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut units = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DiscoveryError::Unreadable {
            dir: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }
        let metadata = fs::metadata(&path).map_err(|source| DiscoveryError::Metadata {
            path: path.clone(),
            source,
        })?;
        if !metadata.is_file() {
            continue;
        }
        let id = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        units.push(BenchmarkUnit {
            id,
            source_path: path,
            source_size_bytes: metadata.len(),
        });
    }

    units.sort_by(|a, b| a.id.cmp(&b.id));
    debug!(dir = %dir.display(), count = units.len(), "discovered units");
    Ok(units)
}
