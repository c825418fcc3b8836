//! Host-wide metric types bundled into one snapshot.

use serde::Serialize;

/// Virtual memory usage in bytes, plus a utilization percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemoryStats {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

impl MemoryStats {
    /// Builds memory stats; `percent` is the share of total memory not
    /// available for new work, rounded to one decimal.
    pub fn new(total: u64, available: u64, used: u64, free: u64) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            round_percent((total.saturating_sub(available)) as f64 / total as f64 * 100.0)
        };
        Self {
            total,
            available,
            used,
            free,
            percent,
        }
    }
}

/// Disk usage for one filesystem, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DiskStats {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

impl DiskStats {
    /// Builds disk stats from total and available space. `free` is space
    /// usable by unprivileged processes; `used` is everything else.
    pub fn from_space(total: u64, available: u64) -> Self {
        let used = total.saturating_sub(available);
        let percent = if total == 0 {
            0.0
        } else {
            round_percent(used as f64 / total as f64 * 100.0)
        };
        Self {
            total,
            used,
            free: available,
            percent,
        }
    }
}

/// 1-, 5- and 15-minute load averages, serialized as a 3-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoadAverage(pub f64, pub f64, pub f64);

/// Host-wide metrics collected for one `stats` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSnapshot {
    /// Global CPU utilization over the observation window, in percent.
    pub cpu: f32,
    pub memory: MemoryStats,
    pub disk: DiskStats,
    pub load_avg: LoadAverage,
}

fn round_percent(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
