//! Best-effort host information for the system section of the report.
//!
//! Everything here is optional: a probe that cannot observe a value leaves it
//! absent and the renderer prints `unknown`.

use serde::{Deserialize, Serialize};

use crate::health::{HealthCheck, Severity};
use crate::memory::{MemoryProbe, ProcessMemory};

/// Host facts observed at report time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpu_count: Option<usize>,
    pub loadavg_1m: Option<f64>,
    pub loadavg_5m: Option<f64>,
    pub loadavg_15m: Option<f64>,
    pub process_memory_bytes: Option<u64>,
    pub terminal_width: Option<u16>,
}

impl SystemInfo {
    /// Info with only the compile-time facts filled in.
    pub fn minimal() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cpu_count: None,
            loadavg_1m: None,
            loadavg_5m: None,
            loadavg_15m: None,
            process_memory_bytes: None,
            terminal_width: None,
        }
    }
}

/// Capability interface for host observation.
pub trait SystemProbe {
    /// Current host facts, or `None` when the probe has nothing to offer.
    fn system_info(&self) -> Option<SystemInfo>;

    /// Checks the probe can derive on its own. Defaults to none.
    fn health_checks(&self) -> Vec<HealthCheck> {
        Vec::new()
    }
}

/// Probe that observes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl SystemProbe for NullProbe {
    fn system_info(&self) -> Option<SystemInfo> {
        None
    }
}

/// Probe of the machine this process runs on.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostProbe;

impl SystemProbe for HostProbe {
    fn system_info(&self) -> Option<SystemInfo> {
        let (l1, l5, l15) = collect_loadavg();
        Some(SystemInfo {
            cpu_count: std::thread::available_parallelism()
                .ok()
                .map(|n| n.get()),
            loadavg_1m: l1,
            loadavg_5m: l5,
            loadavg_15m: l15,
            process_memory_bytes: ProcessMemory.resident_bytes(),
            terminal_width: crossterm::terminal::size().ok().map(|(cols, _)| cols),
            ..SystemInfo::minimal()
        })
    }

    fn health_checks(&self) -> Vec<HealthCheck> {
        let Some(info) = self.system_info() else {
            return Vec::new();
        };
        load_check(&info).into_iter().collect()
    }
}

/// Compare the 1-minute load average with the CPU count.
pub fn load_check(info: &SystemInfo) -> Option<HealthCheck> {
    let load = info.loadavg_1m?;
    let cpus = info.cpu_count? as f64;
    let per_cpu = load / cpus;
    let message = format!("load {load:.2} on {cpus:.0} CPUs");
    let check = if per_cpu > 2.0 {
        HealthCheck::new("System", "load", Severity::Error, message)
            .with_recommendation("run seeding on a less busy host")
    } else if per_cpu > 1.0 {
        HealthCheck::new("System", "load", Severity::Warning, message)
            .with_recommendation("timings may be inflated by other processes")
    } else {
        HealthCheck::new("System", "load", Severity::Ok, message)
    };
    Some(check)
}

fn collect_loadavg() -> (Option<f64>, Option<f64>, Option<f64>) {
    #[cfg(unix)]
    {
        let mut values = [0.0_f64; 3];
        // SAFETY: `getloadavg` writes up to `n` doubles to a valid buffer.
        let n = unsafe { libc::getloadavg(values.as_mut_ptr(), 3) };
        if n <= 0 {
            (None, None, None)
        } else {
            (
                Some(values[0]),
                (n > 1).then_some(values[1]),
                (n > 2).then_some(values[2]),
            )
        }
    }
    #[cfg(not(unix))]
    {
        (None, None, None)
    }
}
