//! Host telemetry from procfs/sysfs: SoC temperature, CPU load and RAM usage.
//!
//! CPU percent is computed from the delta between two consecutive `/proc/stat`
//! snapshots, so the first sample after construction always reports 0.0.
use std::fs;
use std::path::PathBuf;

use proxmotor_traits::SystemSample;
use tracing::trace;

use crate::error::{HwError, Result};

pub const DEFAULT_THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Aggregate jiffy counters from the `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

/// Parse the aggregate `cpu` line. Idle includes iowait; total covers the first eight
/// fields (guest time is already folded into user).
pub fn parse_cpu_times(stat: &str) -> Option<CpuTimes> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .take(8)
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    if fields.len() < 4 {
        return None;
    }
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    let total = fields.iter().sum();
    Some(CpuTimes { idle, total })
}

/// Busy percentage between two snapshots; 0.0 when no time elapsed.
pub fn cpu_percent_between(prev: CpuTimes, cur: CpuTimes) -> f32 {
    let total = cur.total.saturating_sub(prev.total);
    if total == 0 {
        return 0.0;
    }
    let idle = cur.idle.saturating_sub(prev.idle).min(total);
    ((total - idle) as f64 / total as f64 * 100.0) as f32
}

/// `(MemTotal - MemAvailable) / MemTotal` as a percentage.
pub fn parse_mem_percent(meminfo: &str) -> Option<f32> {
    let field = |name: &str| -> Option<u64> {
        meminfo
            .lines()
            .find(|l| l.starts_with(name))?
            .split_whitespace()
            .nth(1)?
            .parse()
            .ok()
    };
    let total = field("MemTotal:")?;
    let available = field("MemAvailable:")?;
    if total == 0 {
        return None;
    }
    let used = total.saturating_sub(available);
    Some((used as f64 / total as f64 * 100.0) as f32)
}

/// Thermal zone files report millidegrees Celsius.
pub fn parse_thermal_millideg(s: &str) -> Option<f32> {
    let milli: f32 = s.trim().parse().ok()?;
    milli.is_finite().then_some(milli / 1000.0)
}

/// Telemetry collaborator backed by `/proc` and the sysfs thermal zone.
#[derive(Debug)]
pub struct ProcSystemStats {
    thermal_zone: PathBuf,
    proc_root: PathBuf,
    prev_cpu: Option<CpuTimes>,
}

impl Default for ProcSystemStats {
    fn default() -> Self {
        Self::new(DEFAULT_THERMAL_ZONE)
    }
}

impl ProcSystemStats {
    pub fn new(thermal_zone: impl Into<PathBuf>) -> Self {
        Self::with_proc_root(thermal_zone, "/proc")
    }

    /// Read `stat` and `meminfo` from `proc_root` instead of `/proc`.
    pub fn with_proc_root(thermal_zone: impl Into<PathBuf>, proc_root: impl Into<PathBuf>) -> Self {
        Self {
            thermal_zone: thermal_zone.into(),
            proc_root: proc_root.into(),
            prev_cpu: None,
        }
    }

    fn read_cpu_temp(&self) -> Option<f32> {
        fs::read_to_string(&self.thermal_zone)
            .ok()
            .and_then(|s| parse_thermal_millideg(&s))
    }

    fn read_file(&self, name: &str) -> Result<String> {
        Ok(fs::read_to_string(self.proc_root.join(name))?)
    }

    pub fn read_sample(&mut self) -> Result<SystemSample> {
        let stat = self.read_file("stat")?;
        let cur = parse_cpu_times(&stat).ok_or_else(|| HwError::Parse {
            what: "/proc/stat",
            detail: "missing aggregate cpu line".into(),
        })?;
        let cpu_percent = self
            .prev_cpu
            .map(|prev| cpu_percent_between(prev, cur))
            .unwrap_or(0.0);
        self.prev_cpu = Some(cur);

        let meminfo = self.read_file("meminfo")?;
        let ram_percent = parse_mem_percent(&meminfo).ok_or_else(|| HwError::Parse {
            what: "/proc/meminfo",
            detail: "missing MemTotal/MemAvailable".into(),
        })?;

        let sample = SystemSample {
            cpu_temp_c: self.read_cpu_temp(),
            cpu_percent,
            ram_percent,
        };
        trace!(?sample, "system stats");
        Ok(sample)
    }
}

impl proxmotor_traits::SystemStats for ProcSystemStats {
    fn sample(
        &mut self,
    ) -> std::result::Result<SystemSample, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.read_sample()?)
    }
}
