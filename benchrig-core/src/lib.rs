#![warn(missing_docs)]
//! benchrig Core - Measured-Execution Engine
//!
//! This crate provides the concurrent engine of the harness:
//! - Unit discovery with deterministic ordering
//! - Pluggable memory probes (polling, self-rusage, external profiler)
//! - Measured child-process execution (wall time, peak memory, exit data)
//! - The per-unit compile→run pipeline with guaranteed artifact cleanup
//! - A bounded worker pool with barrier completion
//! - A thread-safe result aggregator
//!
//! ## Pipeline Overview
//!
//! ```text
//! discover_units
//!       │
//!       ▼
//! ┌─────────────┐
//! │  scheduler  │  K workers pull units from a shared queue
//! └──────┬──────┘
//!        │ per unit
//!        ▼
//! ┌─────────────┐
//! │  pipeline   │  compile → run, one ExecutionResult each
//! └──────┬──────┘
//!        │ measured through
//!        ▼
//! ┌─────────────┐
//! │    probe    │  polling / self-rusage / external-profiler
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ aggregator  │  mutex-serialized, one result per unit
//! └─────────────┘
//! ```

mod aggregator;
mod dataset;
mod execution;
mod pipeline;
pub mod probe;
mod result;
mod scheduler;
mod unit;

pub use aggregator::ResultAggregator;
pub use dataset::{generate_dataset, DatasetConfig, DatasetError};
pub use execution::{ExecOutcome, ExecRequest};
pub use pipeline::{ToolchainConfig, UnitPipeline, ARTIFACT_EXTENSION};
pub use probe::{MemoryProbe, ProbeError, ProbeKind};
pub use result::{ExecutionResult, Status};
pub use scheduler::{ExecutionScheduler, SchedulerError, DEFAULT_WORKERS};
pub use unit::{discover_units, BenchmarkUnit, DiscoveryError};
