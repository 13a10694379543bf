//! Polling probe: fixed-interval resident-set sampling via `/proc`.

use std::fs;
use std::time::Duration;

use super::{MemoryProbe, ProbeError};
use crate::execution::{spawn_and_wait, ExecOutcome, ExecRequest};

/// One resident-memory observation of a live child. Transient: folded into
/// the running maximum immediately, never stored.
#[derive(Debug, Clone, Copy)]
struct MemorySample {
    resident_bytes: u64,
}

/// Samples the child's resident set from `/proc/<pid>/statm` at a fixed
/// interval until the child terminates; the reported peak is the running
/// maximum of all samples.
///
/// A child that exits between the liveness check and the sample read simply
/// yields no sample for that tick; very short-lived children can therefore
/// legitimately report a peak of zero.
pub struct PollingProbe {
    interval: Duration,
    page_size: u64,
}

impl PollingProbe {
    /// Default interval between samples.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

    /// A probe sampling every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            page_size: page_size_bytes(),
        }
    }

    /// Read one sample for `pid`. `None` when the process vanished between
    /// the termination check and the read: that tick is "no sample", not
    /// an error.
    fn sample(&self, pid: u32) -> Option<MemorySample> {
        let statm = fs::read_to_string(format!("/proc/{pid}/statm")).ok()?;
        let resident_pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
        Some(MemorySample {
            resident_bytes: resident_pages * self.page_size,
        })
    }
}

impl Default for PollingProbe {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}

impl MemoryProbe for PollingProbe {
    fn name(&self) -> &'static str {
        "polling"
    }

    fn measure(&self, request: &ExecRequest) -> Result<ExecOutcome, ProbeError> {
        let mut peak: u64 = 0;
        let waited = spawn_and_wait(request, Some(self.interval), |pid| {
            if let Some(sample) = self.sample(pid) {
                peak = peak.max(sample.resident_bytes);
            }
        })
        .map_err(|source| ProbeError::spawn(request, source))?;
        Ok(ExecOutcome::from_waited(waited, peak))
    }
}

fn page_size_bytes() -> u64 {
    // SAFETY: sysconf has no preconditions and only returns a value.
    let ret = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if ret > 0 { ret as u64 } else { 4096 }
}
