//! Synthetic input dataset generation.
//!
//! The dataset is an external collaborator to the execution engine: written
//! exactly once before scheduling begins and never mutated afterwards, so
//! the K concurrent unit programs read it race-free.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::info;

/// Dataset generation failure. Fatal: without input data the batch is
/// meaningless, and this happens before any concurrent work starts.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The parent directory could not be created.
    #[error("failed to create dataset directory {}: {source}", .dir.display())]
    CreateDir {
        /// Directory being created.
        dir: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The dataset file could not be written.
    #[error("failed to write dataset {}: {source}", .path.display())]
    Write {
        /// Dataset location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Dataset settings. The element count is echoed into every result row.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    /// Where the dataset file is written.
    pub path: PathBuf,
    /// Number of elements to generate.
    pub elements: u64,
    /// Fixed seed for reproducible datasets; entropy-seeded when absent.
    pub seed: Option<u64>,
}

/// Write `config.elements` little-endian `u32` values to `config.path`,
/// creating parent directories as needed.
pub fn generate_dataset(config: &DatasetConfig) -> Result<(), DatasetError> {
    if let Some(dir) = config.path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|source| DatasetError::CreateDir {
                dir: dir.to_path_buf(),
                source,
            })?;
        }
    }

    let write_err = |source| DatasetError::Write {
        path: config.path.clone(),
        source,
    };

    let file = File::create(&config.path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);
    let mut rng: StdRng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    for _ in 0..config.elements {
        let value: u32 = rng.gen();
        writer.write_all(&value.to_le_bytes()).map_err(write_err)?;
    }
    writer.flush().map_err(write_err)?;

    info!(
        path = %config.path.display(),
        elements = config.elements,
        "dataset generated"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn dataset_has_four_bytes_per_element() {
        let dir = TempDir::new().unwrap();
        let config = DatasetConfig {
            path: dir.path().join("data/dataset.bin"),
            elements: 16,
            seed: None,
        };
        generate_dataset(&config).unwrap();
        assert_eq!(fs::metadata(&config.path).unwrap().len(), 64);
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let dir = TempDir::new().unwrap();
        let first = DatasetConfig {
            path: dir.path().join("a.bin"),
            elements: 128,
            seed: Some(42),
        };
        let second = DatasetConfig {
            path: dir.path().join("b.bin"),
            elements: 128,
            seed: Some(42),
        };
        generate_dataset(&first).unwrap();
        generate_dataset(&second).unwrap();
        assert_eq!(
            fs::read(&first.path).unwrap(),
            fs::read(&second.path).unwrap()
        );
    }

    #[test]
    fn unwritable_destination_is_an_error() {
        let config = DatasetConfig {
            path: PathBuf::from("/proc/benchrig-cannot-write-here/data.bin"),
            elements: 1,
            seed: None,
        };
        assert!(generate_dataset(&config).is_err());
    }
}
