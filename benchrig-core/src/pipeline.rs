//! Per-unit compile→run pipeline.
//!
//! Drives one unit through `Discovered → Compiling → {CompileFailed |
//! Compiled} → Running → {RunFailed | Ran} → Finalized`, producing exactly
//! one [`ExecutionResult`]. The pipeline is the unit of failure isolation:
//! nothing that happens here can affect a sibling unit.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::execution::ExecRequest;
use crate::probe::MemoryProbe;
use crate::result::{ExecutionResult, Status};
use crate::unit::BenchmarkUnit;

/// Extension given to compiled artifacts; also the cleanup pattern.
pub const ARTIFACT_EXTENSION: &str = "out";

/// External compiler invocation settings.
#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    /// Compiler binary, e.g. `gcc`.
    pub compiler: String,
    /// Extra arguments placed before the source path.
    pub extra_args: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: "gcc".to_string(),
            extra_args: Vec::new(),
        }
    }
}

/// Drives one unit through compile and run phases using the bound probe.
pub struct UnitPipeline<'a> {
    toolchain: &'a ToolchainConfig,
    probe: &'a dyn MemoryProbe,
    dataset_elements: u64,
}

impl<'a> UnitPipeline<'a> {
    /// A pipeline over the given toolchain and probe. `dataset_elements` is
    /// echoed into every produced result.
    pub fn new(
        toolchain: &'a ToolchainConfig,
        probe: &'a dyn MemoryProbe,
        dataset_elements: u64,
    ) -> Self {
        Self {
            toolchain,
            probe,
            dataset_elements,
        }
    }

    /// Artifact path for a unit: `<unit dir>/<stem>.out`. Derived
    /// deterministically from the unit id, so K concurrent pipelines never
    /// clobber each other's output.
    pub fn artifact_path(unit: &BenchmarkUnit) -> PathBuf {
        unit.source_path.with_extension(ARTIFACT_EXTENSION)
    }

    /// Run the unit to completion. Infallible by construction: every failure
    /// mode is folded into the returned record, and the artifact is removed
    /// on every path before returning.
    pub fn run(&self, unit: &BenchmarkUnit) -> ExecutionResult {
        let artifact = Self::artifact_path(unit);
        let result = self.execute_phases(unit, &artifact);
        cleanup_artifact(&artifact);
        result
    }

    fn execute_phases(&self, unit: &BenchmarkUnit, artifact: &Path) -> ExecutionResult {
        // Compile phase
        let compile = match self.probe.measure(&self.compile_request(unit, artifact)) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(unit = %unit.id, error = %e, "compile phase could not start");
                return self.failure_before_compile(unit, e.to_string());
            }
        };
        if compile.exit_code != 0 {
            debug!(unit = %unit.id, code = compile.exit_code, "compilation failed");
            return ExecutionResult {
                unit: unit.id.clone(),
                source_size_bytes: unit.source_size_bytes,
                artifact_size_bytes: None,
                compile_time: compile.elapsed,
                compile_peak_memory_bytes: compile.peak_memory_bytes,
                run_time: Duration::ZERO,
                run_peak_memory_bytes: 0,
                status: Status::CompilationFailed,
                run_exit_code: None,
                error: compile.stderr,
                dataset_elements: self.dataset_elements,
            };
        }

        let artifact_size_bytes = fs::metadata(artifact).map(|m| m.len()).ok();

        // Run phase: direct invocation of the artifact, no arguments.
        match self.probe.measure(&ExecRequest::new(artifact)) {
            Ok(run) => {
                let status = if run.exit_code == 0 {
                    Status::Success
                } else {
                    debug!(unit = %unit.id, code = run.exit_code, "run failed");
                    Status::RuntimeFailed
                };
                ExecutionResult {
                    unit: unit.id.clone(),
                    source_size_bytes: unit.source_size_bytes,
                    artifact_size_bytes,
                    compile_time: compile.elapsed,
                    compile_peak_memory_bytes: compile.peak_memory_bytes,
                    run_time: run.elapsed,
                    run_peak_memory_bytes: run.peak_memory_bytes,
                    status,
                    run_exit_code: Some(run.exit_code),
                    error: run.stderr,
                    dataset_elements: self.dataset_elements,
                }
            }
            Err(e) => {
                warn!(unit = %unit.id, error = %e, "run phase probe failed");
                ExecutionResult {
                    unit: unit.id.clone(),
                    source_size_bytes: unit.source_size_bytes,
                    artifact_size_bytes,
                    compile_time: compile.elapsed,
                    compile_peak_memory_bytes: compile.peak_memory_bytes,
                    run_time: Duration::ZERO,
                    run_peak_memory_bytes: 0,
                    status: Status::RuntimeFailed,
                    run_exit_code: None,
                    error: Some(e.to_string()),
                    dataset_elements: self.dataset_elements,
                }
            }
        }
    }

    /// Record for a compile phase that never produced metrics (e.g. the
    /// compiler binary itself was missing).
    fn failure_before_compile(&self, unit: &BenchmarkUnit, error: String) -> ExecutionResult {
        ExecutionResult {
            unit: unit.id.clone(),
            source_size_bytes: unit.source_size_bytes,
            artifact_size_bytes: None,
            compile_time: Duration::ZERO,
            compile_peak_memory_bytes: 0,
            run_time: Duration::ZERO,
            run_peak_memory_bytes: 0,
            status: Status::CompilationFailed,
            run_exit_code: None,
            error: Some(error),
            dataset_elements: self.dataset_elements,
        }
    }

    fn compile_request(&self, unit: &BenchmarkUnit, artifact: &Path) -> ExecRequest {
        let mut args = self.toolchain.extra_args.clone();
        args.push(unit.source_path.display().to_string());
        args.push("-o".to_string());
        args.push(artifact.display().to_string());
        ExecRequest::with_args(&self.toolchain.compiler, args)
    }
}

/// Unconditional artifact cleanup. Absence is a no-op (compile failures
/// never produced one); any other deletion error is logged and does not
/// invalidate the already-recorded result.
fn cleanup_artifact(artifact: &Path) {
    match fs::remove_file(artifact) {
        Ok(()) => debug!(artifact = %artifact.display(), "removed artifact"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(artifact = %artifact.display(), error = %e, "failed to remove artifact"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_path_replaces_the_source_extension() {
        let unit = BenchmarkUnit {
            id: "quickSort.c".to_string(),
            source_path: PathBuf::from("/work/units/quickSort.c"),
            source_size_bytes: 1,
        };
        assert_eq!(
            UnitPipeline::artifact_path(&unit),
            PathBuf::from("/work/units/quickSort.out")
        );
    }

    #[test]
    fn compile_request_orders_source_then_output() {
        let toolchain = ToolchainConfig {
            compiler: "cc".to_string(),
            extra_args: vec!["-O2".to_string()],
        };
        let probe = crate::probe::SelfRusageProbe::new();
        let pipeline = UnitPipeline::new(&toolchain, &probe, 0);
        let unit = BenchmarkUnit {
            id: "a.c".to_string(),
            source_path: PathBuf::from("units/a.c"),
            source_size_bytes: 1,
        };
        let request = pipeline.compile_request(&unit, Path::new("units/a.out"));

        assert_eq!(request.program, PathBuf::from("cc"));
        assert_eq!(request.args, ["-O2", "units/a.c", "-o", "units/a.out"]);
    }

    #[test]
    fn cleanup_of_missing_artifact_is_a_noop() {
        cleanup_artifact(Path::new("/tmp/benchrig-no-such-artifact.out"));
    }
}
