//! Thread-safe result aggregation.

use std::collections::BTreeMap;
use std::sync::Mutex;

use tracing::warn;

use crate::result::ExecutionResult;

/// Sink collecting exactly one [`ExecutionResult`] per unit, regardless of
/// completion order.
///
/// Inserts are serialized by a mutex and append-only: results are never
/// mutated after insertion. After the scheduler's barrier returns, the
/// collection size must equal the number of submitted units.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    results: Mutex<BTreeMap<String, ExecutionResult>>,
}

impl ResultAggregator {
    /// An empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one unit's result. A duplicate unit id indicates a harness
    /// bug; the first record wins and the duplicate is logged.
    pub fn insert(&self, result: ExecutionResult) {
        let mut results = self.results.lock().unwrap_or_else(|e| e.into_inner());
        if results.contains_key(&result.unit) {
            warn!(unit = %result.unit, "duplicate result for unit; keeping the first");
            return;
        }
        results.insert(result.unit.clone(), result);
    }

    /// Number of collected results.
    pub fn len(&self) -> usize {
        self.results.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether nothing has been collected yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read-only snapshot ordered by unit id, for the report sink.
    pub fn snapshot(&self) -> Vec<ExecutionResult> {
        self.results
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Status;
    use std::sync::Arc;
    use std::time::Duration;

    fn result_for(unit: &str) -> ExecutionResult {
        ExecutionResult {
            unit: unit.to_string(),
            source_size_bytes: 10,
            artifact_size_bytes: Some(20),
            compile_time: Duration::from_micros(5),
            compile_peak_memory_bytes: 1024,
            run_time: Duration::from_micros(7),
            run_peak_memory_bytes: 2048,
            status: Status::Success,
            run_exit_code: Some(0),
            error: None,
            dataset_elements: 100,
        }
    }

    #[test]
    fn concurrent_inserts_all_land() {
        let aggregator = Arc::new(ResultAggregator::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let aggregator = Arc::clone(&aggregator);
                std::thread::spawn(move || {
                    aggregator.insert(result_for(&format!("unit_{i:02}.c")));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(aggregator.len(), 16);
        let snapshot = aggregator.snapshot();
        assert_eq!(snapshot.first().unwrap().unit, "unit_00.c");
        assert_eq!(snapshot.last().unwrap().unit, "unit_15.c");
    }

    #[test]
    fn snapshot_is_sorted_by_unit_id() {
        let aggregator = ResultAggregator::new();
        for unit in ["c.c", "a.c", "b.c"] {
            aggregator.insert(result_for(unit));
        }
        let ids: Vec<String> = aggregator.snapshot().into_iter().map(|r| r.unit).collect();
        assert_eq!(ids, ["a.c", "b.c", "c.c"]);
    }

    #[test]
    fn duplicate_insert_keeps_the_first_record() {
        let aggregator = ResultAggregator::new();
        aggregator.insert(result_for("dup.c"));
        let mut second = result_for("dup.c");
        second.status = Status::RuntimeFailed;
        aggregator.insert(second);

        assert_eq!(aggregator.len(), 1);
        assert_eq!(aggregator.snapshot()[0].status, Status::Success);
    }
}
