//! Self-rusage probe: `ru_maxrss` delta around the child's lifetime.
//!
//! Reads the measuring process's own peak-memory accounting before and after
//! the child runs and reports the delta. This is a documented approximation:
//! it attributes the harness's allocation delta, not the child's actual
//! peak, and can under- or over-report for short-lived children. Prefer the
//! polling or external-profiler strategies when the child's own footprint
//! matters.

use super::{MemoryProbe, ProbeError};
use crate::execution::{spawn_and_wait, ExecOutcome, ExecRequest};

/// Probe measuring the harness process's `getrusage(RUSAGE_SELF)` peak-RSS
/// delta across the spawn/wait boundary.
#[derive(Debug, Default)]
pub struct SelfRusageProbe;

impl SelfRusageProbe {
    /// A new self-rusage probe.
    pub fn new() -> Self {
        Self
    }
}

impl MemoryProbe for SelfRusageProbe {
    fn name(&self) -> &'static str {
        "self-rusage"
    }

    fn measure(&self, request: &ExecRequest) -> Result<ExecOutcome, ProbeError> {
        let before = self_max_rss_bytes();
        let waited = spawn_and_wait(request, None, |_| {})
            .map_err(|source| ProbeError::spawn(request, source))?;
        let after = self_max_rss_bytes();
        Ok(ExecOutcome::from_waited(
            waited,
            after.saturating_sub(before),
        ))
    }
}

/// Peak resident set size of the calling process, in bytes.
/// Linux reports `ru_maxrss` in kilobytes, macOS in bytes.
fn self_max_rss_bytes() -> u64 {
    // SAFETY: rusage is plain old data; zeroed bytes are a valid initial state.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    // SAFETY: getrusage writes into a stack-allocated struct we own.
    let ret = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if ret != 0 {
        return 0;
    }
    if cfg!(target_os = "macos") {
        usage.ru_maxrss as u64
    } else {
        usage.ru_maxrss as u64 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_peak_rss_is_nonzero() {
        assert!(self_max_rss_bytes() > 0);
    }

    #[test]
    fn measure_completes_and_reports_exit() {
        let probe = SelfRusageProbe::new();
        let request = ExecRequest::with_args("sh", vec!["-c".into(), "exit 0".into()]);
        let outcome = probe.measure(&request).unwrap();
        assert_eq!(outcome.exit_code, 0);
        // The delta may be zero for a child smaller than the harness's own
        // high-water mark; it must never go negative.
        let _ = outcome.peak_memory_bytes;
    }
}
