//! External-profiler probe: wrap the run under a heap profiler and parse
//! its report.
//!
//! The command is re-run under `valgrind --tool=massif`, which writes a
//! structured text report; the peak is the maximum `mem_heap_B=<n>` record.
//! A missing report after the wrapped run gets one bounded retry (a fresh
//! wrapped run), then surfaces as [`ProbeError::ReportMissing`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use regex::Regex;
use tracing::warn;

use super::{MemoryProbe, ProbeError};
use crate::execution::{spawn_and_wait, ExecOutcome, ExecRequest};

/// Total wrapped-run attempts before the missing report becomes an error.
const MAX_ATTEMPTS: u32 = 2;

/// Probe that re-runs the command wrapped by an external heap profiler.
pub struct ProfilerProbe {
    profiler: String,
    report_dir: PathBuf,
}

impl ProfilerProbe {
    /// A probe wrapping runs with `profiler` (typically `valgrind`).
    pub fn new(profiler: impl Into<String>) -> Self {
        Self {
            profiler: profiler.into(),
            report_dir: std::env::temp_dir(),
        }
    }

    /// Unique report path per invocation so concurrent pipelines never share
    /// a report file.
    fn report_path(&self) -> PathBuf {
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        self.report_dir
            .join(format!("massif.{}.{}.out", std::process::id(), seq))
    }

    /// The original request rewritten as a profiler invocation.
    fn wrapped(&self, request: &ExecRequest, report: &Path) -> ExecRequest {
        let mut args = vec![
            "--tool=massif".to_string(),
            format!("--massif-out-file={}", report.display()),
            request.program.display().to_string(),
        ];
        args.extend(request.args.iter().cloned());
        ExecRequest::with_args(&self.profiler, args)
    }
}

impl MemoryProbe for ProfilerProbe {
    fn name(&self) -> &'static str {
        "external-profiler"
    }

    fn measure(&self, request: &ExecRequest) -> Result<ExecOutcome, ProbeError> {
        let report = self.report_path();
        let wrapped = self.wrapped(request, &report);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let waited = spawn_and_wait(&wrapped, None, |_| {})
                .map_err(|source| ProbeError::spawn(&wrapped, source))?;

            match fs::read_to_string(&report) {
                Ok(text) => {
                    let peak = parse_peak_heap_bytes(&text);
                    let _ = fs::remove_file(&report);
                    // The profiler passes the child's exit code through.
                    return Ok(ExecOutcome::from_waited(waited, peak));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    if attempt >= MAX_ATTEMPTS {
                        return Err(ProbeError::ReportMissing {
                            path: report,
                            attempts: attempt,
                        });
                    }
                    warn!(
                        report = %report.display(),
                        attempt,
                        "profiler report missing; retrying once"
                    );
                }
                Err(source) => {
                    return Err(ProbeError::ReportUnreadable {
                        path: report,
                        source,
                    });
                }
            }
        }
    }
}

/// Maximum `mem_heap_B=<n>` record in a massif report; 0 when no record
/// matches.
fn parse_peak_heap_bytes(report: &str) -> u64 {
    let Ok(re) = Regex::new(r"(?m)^mem_heap_B=(\d+)$") else {
        return 0;
    };
    re.captures_iter(report)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}
