//! System-level metric sampling — the capability seam the design notes
//! call for ("randomised metrics used as placeholders in the source"
//! become a seam an implementer wires real measurements into). This
//! samples real process resource usage via `getrusage(2)` rather than
//! synthesizing numbers, so the monitoring loop always has something
//! genuine to threshold against even before a richer metrics exporter
//! is wired in.

use std::time::Instant;

/// CPU and memory usage expressed as percentages, matching the
/// `alertThresholds` configuration's units (§6).
#[derive(Debug, Clone, Copy)]
pub struct SystemSample {
    pub cpu_usage_pct: f64,
    pub memory_usage_pct: f64,
    pub uptime_secs: f64,
}

pub struct SystemMetricsSource {
    started_at: Instant,
    /// Ceiling used to express resident memory as a percentage; a real
    /// deployment would read this from cgroup limits or `sysconf`.
    memory_ceiling_bytes: f64,
}

impl SystemMetricsSource {
    pub fn new(memory_ceiling_bytes: u64) -> Self {
        Self {
            started_at: Instant::now(),
            memory_ceiling_bytes: memory_ceiling_bytes as f64,
        }
    }

    pub fn sample(&self) -> SystemSample {
        let uptime_secs = self.started_at.elapsed().as_secs_f64();
        let (user_secs, sys_secs, max_rss_bytes) = read_rusage();
        let cpu_secs = user_secs + sys_secs;
        let cpu_usage_pct = if uptime_secs > 0.0 {
            (cpu_secs / uptime_secs * 100.0).min(100.0)
        } else {
            0.0
        };
        let memory_usage_pct = if self.memory_ceiling_bytes > 0.0 {
            (max_rss_bytes / self.memory_ceiling_bytes * 100.0).min(100.0)
        } else {
            0.0
        };
        SystemSample {
            cpu_usage_pct,
            memory_usage_pct,
            uptime_secs,
        }
    }
}

#[cfg(unix)]
fn read_rusage() -> (f64, f64, f64) {
    use std::mem::MaybeUninit;

    let mut usage = MaybeUninit::<libc::rusage>::uninit();
    // SAFETY: `getrusage` writes a fully-initialized `rusage` into a
    // buffer sized for it; `RUSAGE_SELF` is always valid.
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return (0.0, 0.0, 0.0);
    }
    // SAFETY: `getrusage` returned 0, so `usage` is initialized.
    let usage = unsafe { usage.assume_init() };
    let user = usage.ru_utime.tv_sec as f64 + usage.ru_utime.tv_usec as f64 / 1_000_000.0;
    let sys = usage.ru_stime.tv_sec as f64 + usage.ru_stime.tv_usec as f64 / 1_000_000.0;
    // ru_maxrss is kilobytes on Linux, bytes on macOS; this repo targets
    // Linux deployment so kilobytes is assumed.
    let max_rss_bytes = usage.ru_maxrss as f64 * 1024.0;
    (user, sys, max_rss_bytes)
}

#[cfg(not(unix))]
fn read_rusage() -> (f64, f64, f64) {
    (0.0, 0.0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_returns_non_negative_values() {
        let source = SystemMetricsSource::new(2 * 1024 * 1024 * 1024);
        let sample = source.sample();
        assert!(sample.cpu_usage_pct >= 0.0);
        assert!(sample.memory_usage_pct >= 0.0);
        assert!(sample.uptime_secs >= 0.0);
    }
}
