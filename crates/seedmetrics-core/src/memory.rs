//! Process memory observation and per-job timing.
//!
//! Memory readings are best-effort: a platform that cannot report resident
//! memory yields `None`, and the job's memory delta is recorded as 0.

use std::time::{Duration, Instant};

/// Source of the current process memory footprint.
pub trait MemoryProbe: Send + Sync {
    /// Resident memory in bytes, if observable.
    fn resident_bytes(&self) -> Option<u64>;
}

impl<F> MemoryProbe for F
where
    F: Fn() -> Option<u64> + Send + Sync,
{
    fn resident_bytes(&self) -> Option<u64> {
        self()
    }
}

/// Reads this process's memory from the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessMemory;

impl MemoryProbe for ProcessMemory {
    fn resident_bytes(&self) -> Option<u64> {
        process_resident_bytes()
    }
}

/// Probe that never observes anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMemory;

impl MemoryProbe for NoMemory {
    fn resident_bytes(&self) -> Option<u64> {
        None
    }
}

#[cfg(target_os = "linux")]
fn process_resident_bytes() -> Option<u64> {
    // statm: size resident shared text lib data dt (in pages)
    let raw = std::fs::read_to_string("/proc/self/statm").ok()?;
    let pages: u64 = raw.split_whitespace().nth(1)?.parse().ok()?;
    // SAFETY: sysconf has no memory-safety preconditions.
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size <= 0 {
        return None;
    }
    Some(pages * page_size as u64)
}

#[cfg(all(unix, not(target_os = "linux")))]
fn process_resident_bytes() -> Option<u64> {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    // SAFETY: `getrusage` fills the provided, properly sized buffer.
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: initialised by the successful call above.
    let usage = unsafe { usage.assume_init() };
    let max_rss = u64::try_from(usage.ru_maxrss).ok()?;
    // Peak RSS: bytes on macOS, KiB on the BSDs.
    if cfg!(target_os = "macos") {
        Some(max_rss)
    } else {
        Some(max_rss * 1024)
    }
}

#[cfg(not(unix))]
fn process_resident_bytes() -> Option<u64> {
    None
}

/// Difference between two optional readings, 0 when either is missing.
pub fn memory_delta(start: Option<u64>, end: Option<u64>) -> i64 {
    match (start, end) {
        (Some(s), Some(e)) => {
            let s = i64::try_from(s).unwrap_or(i64::MAX);
            let e = i64::try_from(e).unwrap_or(i64::MAX);
            e.saturating_sub(s)
        }
        _ => 0,
    }
}

/// Elapsed time and memory delta of one finished job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobMeasurement {
    pub elapsed: Duration,
    pub memory_delta_bytes: i64,
}

impl JobMeasurement {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Measures one job from `start` to `stop`.
pub struct JobTimer<'a> {
    started: Instant,
    start_memory: Option<u64>,
    probe: &'a dyn MemoryProbe,
}

impl<'a> JobTimer<'a> {
    pub fn start(probe: &'a dyn MemoryProbe) -> Self {
        Self {
            start_memory: probe.resident_bytes(),
            started: Instant::now(),
            probe,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn stop(self) -> JobMeasurement {
        let elapsed = self.started.elapsed();
        JobMeasurement {
            elapsed,
            memory_delta_bytes: memory_delta(self.start_memory, self.probe.resident_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn delta_handles_missing_readings() {
        assert_eq!(memory_delta(Some(100), Some(250)), 150);
        assert_eq!(memory_delta(Some(250), Some(100)), -150);
        assert_eq!(memory_delta(None, Some(100)), 0);
        assert_eq!(memory_delta(Some(100), None), 0);
    }

    #[test]
    fn timer_uses_probe_readings() {
        let reading = AtomicU64::new(1_000);
        let probe = || Some(reading.load(Ordering::SeqCst));
        let timer = JobTimer::start(&probe);
        reading.store(5_096, Ordering::SeqCst);
        let m = timer.stop();
        assert_eq!(m.memory_delta_bytes, 4_096);
        assert!(m.elapsed_seconds() >= 0.0);
    }

    #[test]
    fn no_memory_probe_gives_zero_delta() {
        let m = JobTimer::start(&NoMemory).stop();
        assert_eq!(m.memory_delta_bytes, 0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn process_memory_is_observable_on_linux() {
        assert!(ProcessMemory.resident_bytes().unwrap_or(0) > 0);
    }
}
