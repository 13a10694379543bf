//! Bounded-concurrency batch scheduling.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use thiserror::Error;
use tracing::info;

use crate::aggregator::ResultAggregator;
use crate::pipeline::UnitPipeline;
use crate::result::ExecutionResult;
use crate::unit::BenchmarkUnit;

/// Default worker-pool size.
pub const DEFAULT_WORKERS: usize = 8;

/// Scheduler setup failure.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The worker pool could not be built.
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Bounded worker pool dispatching one [`UnitPipeline`] invocation per
/// discovered unit.
///
/// Workers pull units from a shared queue with no ordering guarantee across
/// units; within one unit, compile strictly precedes run. `run_batch` has
/// barrier semantics: it returns only after every submitted unit has
/// produced a result. One unit's failure never cancels the others.
pub struct ExecutionScheduler {
    workers: usize,
}

impl ExecutionScheduler {
    /// A scheduler with a pool of `workers` (clamped to at least 1).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Process every unit through `pipeline`, collecting into `aggregator`.
    ///
    /// `on_result` fires once per completed unit, in completion order;
    /// progress reporting and structured logging hook in there without
    /// coupling to the pipeline.
    pub fn run_batch(
        &self,
        units: &[BenchmarkUnit],
        pipeline: &UnitPipeline<'_>,
        aggregator: &ResultAggregator,
        on_result: impl Fn(&ExecutionResult) + Sync,
    ) -> Result<(), SchedulerError> {
        if units.is_empty() {
            return Ok(());
        }

        let workers = self.workers.min(units.len());
        let pool = ThreadPoolBuilder::new().num_threads(workers).build()?;
        info!(units = units.len(), workers, "dispatching batch");

        pool.install(|| {
            units.par_iter().for_each(|unit| {
                let result = pipeline.run(unit);
                on_result(&result);
                aggregator.insert(result);
            });
        });

        Ok(())
    }
}

impl Default for ExecutionScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{ExecOutcome, ExecRequest};
    use crate::pipeline::ToolchainConfig;
    use crate::probe::{MemoryProbe, ProbeError};
    use crate::result::Status;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Probe double that never spawns anything: compile requests (those
    /// carrying `-o`) fail for sources containing `broken`, everything else
    /// succeeds instantly.
    struct CannedProbe;

    impl MemoryProbe for CannedProbe {
        fn name(&self) -> &'static str {
            "canned"
        }

        fn measure(&self, request: &ExecRequest) -> Result<ExecOutcome, ProbeError> {
            let is_compile = request.args.iter().any(|a| a == "-o");
            let failing = is_compile && request.args.iter().any(|a| a.contains("broken"));
            Ok(ExecOutcome {
                elapsed: Duration::from_micros(50),
                peak_memory_bytes: 4096,
                exit_code: if failing { 1 } else { 0 },
                stderr: failing.then(|| "synthetic compile error".to_string()),
            })
        }
    }

    fn units(n: usize) -> Vec<BenchmarkUnit> {
        (0..n)
            .map(|i| BenchmarkUnit {
                id: format!("unit_{i:02}.c"),
                source_path: PathBuf::from(format!("/nowhere/unit_{i:02}.c")),
                source_size_bytes: 64,
            })
            .collect()
    }

    #[test]
    fn every_unit_produces_exactly_one_result() {
        let toolchain = ToolchainConfig::default();
        let probe = CannedProbe;
        let pipeline = UnitPipeline::new(&toolchain, &probe, 1000);
        let aggregator = ResultAggregator::new();
        let completed = AtomicUsize::new(0);

        let scheduler = ExecutionScheduler::new(4);
        scheduler
            .run_batch(&units(10), &pipeline, &aggregator, |_| {
                completed.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();

        assert_eq!(aggregator.len(), 10);
        assert_eq!(completed.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn one_failing_unit_does_not_affect_siblings() {
        let mut batch = units(5);
        batch[2].id = "broken_unit.c".to_string();
        batch[2].source_path = PathBuf::from("/nowhere/broken_unit.c");

        let toolchain = ToolchainConfig::default();
        let probe = CannedProbe;
        let pipeline = UnitPipeline::new(&toolchain, &probe, 0);
        let aggregator = ResultAggregator::new();

        ExecutionScheduler::new(2)
            .run_batch(&batch, &pipeline, &aggregator, |_| {})
            .unwrap();

        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.len(), 5);
        for result in &snapshot {
            if result.unit == "broken_unit.c" {
                assert_eq!(result.status, Status::CompilationFailed);
                assert_eq!(result.error.as_deref(), Some("synthetic compile error"));
                assert_eq!(result.run_time, Duration::ZERO);
            } else {
                assert_eq!(result.status, Status::Success);
                assert_eq!(result.run_exit_code, Some(0));
            }
        }
    }

    #[test]
    fn empty_batch_is_a_noop() {
        let toolchain = ToolchainConfig::default();
        let probe = CannedProbe;
        let pipeline = UnitPipeline::new(&toolchain, &probe, 0);
        let aggregator = ResultAggregator::new();

        ExecutionScheduler::default()
            .run_batch(&[], &pipeline, &aggregator, |_| {})
            .unwrap();
        assert!(aggregator.is_empty());
    }
}
