//! Host-wide snapshot collection.
//!
//! Everything one `"stats"` request needs beyond the process table:
//! CPU/memory/disk/load, the process-state histogram, login data,
//! uptime, and the system log tail. Data-source failures degrade to
//! documented in-band values; nothing here fails a snapshot as a whole.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sysinfo::{Disks, System};
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::debug;

use hostwatch_core::{
    format_uptime, parse_login_history, parse_login_table, DiskStats, LoadAverage, LoggedInUser,
    LoginEntry, MemoryStats, ProcessSummary, StateCounts, SystemSnapshot,
};

/// Observation window for the two-point CPU sample. The dominant latency
/// cost of one snapshot cycle.
pub const CPU_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// How many accounting records the login-history query asks for.
pub const LOGIN_HISTORY_DEPTH: u32 = 20;

/// How many trailing log lines the tail returns.
pub const SYSLOG_TAIL_LINES: usize = 20;

/// Sentinel line reported when the system log path is absent.
pub const SYSLOG_MISSING_SENTINEL: &str = "System log file not found.";

/// The login-accounting query failed before parsing could start.
#[derive(Debug, Error)]
pub enum LoginQueryError {
    #[error("failed to run last: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("last exited with {status}")]
    Failed { status: std::process::ExitStatus },
}

/// Collects host-wide metrics for the stats engine.
///
/// Keeps the CPU sampler between calls; the lock is never held across
/// the 1-second sample window, so one session's snapshot does not stall
/// another's.
pub struct SnapshotCollector {
    system: Mutex<System>,
    syslog_path: PathBuf,
}

impl SnapshotCollector {
    pub fn new(syslog_path: impl Into<PathBuf>) -> Self {
        Self {
            system: Mutex::new(System::new()),
            syslog_path: syslog_path.into(),
        }
    }

    /// Gathers CPU, memory, disk and load in one pass.
    ///
    /// The CPU figure is a two-point sample over `CPU_SAMPLE_INTERVAL`,
    /// so the first call is as accurate as any later one.
    pub async fn collect_snapshot(&self) -> SystemSnapshot {
        {
            let mut system = self.system.lock().await;
            system.refresh_cpu_usage();
        }

        tokio::time::sleep(CPU_SAMPLE_INTERVAL).await;

        let (cpu, memory) = {
            let mut system = self.system.lock().await;
            system.refresh_cpu_usage();
            system.refresh_memory();
            let memory = MemoryStats::new(
                system.total_memory(),
                system.available_memory(),
                system.used_memory(),
                system.free_memory(),
            );
            (system.global_cpu_usage(), memory)
        };

        SystemSnapshot {
            cpu,
            memory,
            disk: root_disk_usage(),
            load_avg: load_average(),
        }
    }

    /// Builds the process-state histogram.
    ///
    /// The total counts the listing; a process that exits before its
    /// state is read stays in the total but lands in no bucket.
    pub async fn summarize_processes(&self) -> ProcessSummary {
        tokio::task::spawn_blocking(summarize_blocking)
            .await
            .unwrap_or_default()
    }

    /// Enumerates active login sessions via `who`, in table order.
    /// Query failure degrades to an empty list.
    pub async fn logged_in_users(&self) -> Vec<LoggedInUser> {
        match Command::new("who").output().await {
            Ok(output) if output.status.success() => {
                parse_login_table(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                debug!(status = %output.status, "who exited with failure");
                Vec::new()
            }
            Err(error) => {
                debug!(%error, "failed to run who");
                Vec::new()
            }
        }
    }

    /// Queries the last `LOGIN_HISTORY_DEPTH` login-accounting records.
    pub async fn recent_logins(&self) -> Result<Vec<LoginEntry>, LoginQueryError> {
        let output = Command::new("last")
            .arg("-n")
            .arg(LOGIN_HISTORY_DEPTH.to_string())
            .output()
            .await?;

        if !output.status.success() {
            return Err(LoginQueryError::Failed {
                status: output.status,
            });
        }

        Ok(parse_login_history(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }

    /// Time since boot as `"{d}d {h}h {m}m"`.
    pub fn uptime(&self) -> String {
        format_uptime(System::uptime())
    }

    /// Last `SYSLOG_TAIL_LINES` lines of the system log, or the
    /// missing-file sentinel when the path cannot be read.
    pub async fn tail_syslog(&self) -> Vec<String> {
        match tokio::fs::read_to_string(&self.syslog_path).await {
            Ok(contents) => {
                let total = contents.lines().count();
                contents
                    .lines()
                    .skip(total.saturating_sub(SYSLOG_TAIL_LINES))
                    .map(str::to_string)
                    .collect()
            }
            Err(error) => {
                debug!(
                    path = %self.syslog_path.display(),
                    %error,
                    "system log unavailable"
                );
                vec![SYSLOG_MISSING_SENTINEL.to_string()]
            }
        }
    }
}

fn summarize_blocking() -> ProcessSummary {
    let Ok(table) = procfs::process::all_processes() else {
        return ProcessSummary::default();
    };

    let mut total = 0;
    let mut states = StateCounts::default();
    for process in table.flatten() {
        total += 1;
        if let Ok(stat) = process.stat() {
            states.record(stat.state);
        }
    }

    ProcessSummary {
        total_processes: total,
        states,
    }
}

/// Usage of the root filesystem. Falls back to the first listed disk on
/// hosts where `/` is not its own mount.
fn root_disk_usage() -> DiskStats {
    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .find(|disk| disk.mount_point() == Path::new("/"))
        .or_else(|| disks.list().first())
        .map(|disk| DiskStats::from_space(disk.total_space(), disk.available_space()))
        .unwrap_or_else(|| DiskStats::from_space(0, 0))
}

fn load_average() -> LoadAverage {
    let load = System::load_average();
    LoadAverage(load.one, load.five, load.fifteen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_tail_syslog_missing_path_is_exact_sentinel() {
        let collector = SnapshotCollector::new("/nonexistent/hostwatch-test.log");
        assert_eq!(
            collector.tail_syslog().await,
            vec![SYSLOG_MISSING_SENTINEL.to_string()]
        );
    }

    #[tokio::test]
    async fn test_tail_syslog_caps_at_twenty_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 1..=25 {
            writeln!(file, "line {i}").unwrap();
        }
        file.flush().unwrap();

        let collector = SnapshotCollector::new(file.path());
        let tail = collector.tail_syslog().await;

        assert_eq!(tail.len(), SYSLOG_TAIL_LINES);
        assert_eq!(tail.first().unwrap(), "line 6");
        assert_eq!(tail.last().unwrap(), "line 25");
    }

    #[tokio::test]
    async fn test_tail_syslog_short_file_returned_whole() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "only line").unwrap();
        file.flush().unwrap();

        let collector = SnapshotCollector::new(file.path());
        assert_eq!(collector.tail_syslog().await, vec!["only line".to_string()]);
    }

    #[test]
    fn test_uptime_matches_pattern() {
        let collector = SnapshotCollector::new("/var/log/syslog");
        let uptime = collector.uptime();

        let mut parts = uptime.split(' ');
        let days = parts.next().unwrap();
        let hours = parts.next().unwrap();
        let minutes = parts.next().unwrap();
        assert!(parts.next().is_none());
        assert!(days.strip_suffix('d').unwrap().parse::<u64>().is_ok());
        assert!(hours.strip_suffix('h').unwrap().parse::<u64>().is_ok());
        assert!(minutes.strip_suffix('m').unwrap().parse::<u64>().is_ok());
    }

    #[tokio::test]
    async fn test_summarize_counts_running_processes() {
        let collector = SnapshotCollector::new("/var/log/syslog");
        let summary = collector.summarize_processes().await;

        assert!(summary.total_processes > 0);
        let bucketed = summary.states.running
            + summary.states.sleeping
            + summary.states.stopped
            + summary.states.zombie
            + summary.states.idle
            + summary.states.other;
        assert!(bucketed as usize <= summary.total_processes);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_collect_snapshot_reads_real_host() {
        let collector = SnapshotCollector::new("/var/log/syslog");
        let snapshot = collector.collect_snapshot().await;

        assert!(snapshot.cpu >= 0.0);
        assert!(snapshot.memory.total > 0);
        assert!(snapshot.memory.percent >= 0.0 && snapshot.memory.percent <= 100.0);
        assert!(snapshot.load_avg.0 >= 0.0);
    }
}
