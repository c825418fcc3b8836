//! Concurrent process-table enumeration.
//!
//! Listing is a point-in-time scan: a retained `sysinfo::System`
//! supplies the OS-tracked CPU delta per pid (the first scan reads 0.0)
//! plus the memory share and owning user, then one bounded worker per
//! pid inspects the live process through `/proc`. A process that
//! disappears, denies access, or turned zombie between listing and
//! inspection degrades to the all-"N/A" record; the scan continues for
//! the rest of the table.

use std::sync::Arc;

use chrono::{Local, LocalResult, TimeZone};
use sysinfo::{ProcessesToUpdate, System, Users};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::debug;

use procfs::WithCurrentSystemInfo;

use hostwatch_core::{ProcessRecord, ProcessSample};

/// Worker-pool width for per-process inspection.
pub const DEFAULT_INSPECTION_WORKERS: usize = 64;

/// Data captured for one pid at listing time, before inspection.
#[derive(Debug, Clone)]
struct ListedProcess {
    pid: u32,
    owner: Option<String>,
    cpu_percent: f32,
    memory_percent: f64,
}

/// Scans the process table and produces one `ProcessRecord` per listed
/// process. Keeps the sampler between calls so CPU percentages read the
/// delta since the previous scan.
pub struct ProcessEnumerator {
    system: Mutex<System>,
    workers: usize,
}

impl ProcessEnumerator {
    pub fn new() -> Self {
        Self::with_workers(DEFAULT_INSPECTION_WORKERS)
    }

    /// Enumerator with a custom worker-pool width (mainly for tests).
    pub fn with_workers(workers: usize) -> Self {
        Self {
            system: Mutex::new(System::new()),
            workers: workers.max(1),
        }
    }

    /// Runs one full scan: list, fan out inspection, join on all of it.
    ///
    /// No ordering is guaranteed; records come back in completion order.
    pub async fn enumerate(&self) -> Vec<ProcessRecord> {
        let listing = self.list_processes().await;
        let boot_time = procfs::boot_time_secs().unwrap_or(0);

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for listed in listing {
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // Acquire only fails when the semaphore is closed, which
                // never happens while the JoinSet is alive.
                let Ok(_permit) = semaphore.acquire().await else {
                    return ProcessRecord::Unavailable;
                };
                tokio::task::spawn_blocking(move || inspect(listed, boot_time))
                    .await
                    .unwrap_or(ProcessRecord::Unavailable)
            });
        }

        let mut records = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            records.push(joined.unwrap_or(ProcessRecord::Unavailable));
        }

        debug!(
            total = records.len(),
            unavailable = records.iter().filter(|r| r.is_unavailable()).count(),
            "process scan complete"
        );
        records
    }

    async fn list_processes(&self) -> Vec<ListedProcess> {
        let users = Users::new_with_refreshed_list();

        let mut system = self.system.lock().await;
        system.refresh_memory();
        system.refresh_processes(ProcessesToUpdate::All, true);

        let total_memory = system.total_memory();
        system
            .processes()
            .iter()
            .map(|(pid, process)| {
                let owner = process
                    .user_id()
                    .and_then(|uid| users.get_user_by_id(uid))
                    .map(|user| user.name().to_string());
                let memory_percent = if total_memory == 0 {
                    0.0
                } else {
                    process.memory() as f64 / total_memory as f64 * 100.0
                };
                ListedProcess {
                    pid: pid.as_u32(),
                    owner,
                    cpu_percent: process.cpu_usage(),
                    memory_percent,
                }
            })
            .collect()
    }
}

impl Default for ProcessEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

/// One inspection unit: reads `/proc/<pid>/stat` and merges it with the
/// listing data. Every failure path collapses to the fallback record so
/// a partially-read process can never leak a mixed row.
fn inspect(listed: ListedProcess, boot_time: u64) -> ProcessRecord {
    let Some(owner) = listed.owner else {
        return ProcessRecord::Unavailable;
    };
    let Ok(process) = procfs::process::Process::new(listed.pid as i32) else {
        return ProcessRecord::Unavailable;
    };
    let Ok(stat) = process.stat() else {
        return ProcessRecord::Unavailable;
    };
    if stat.state == 'Z' {
        return ProcessRecord::Unavailable;
    }

    let ticks = procfs::ticks_per_second().max(1);
    let cpu_time = (stat.utime + stat.stime) as f64 / ticks as f64;

    ProcessRecord::Sampled(ProcessSample {
        owner,
        pid: listed.pid,
        cpu_percent: format!("{:.1}", listed.cpu_percent),
        memory_percent: format!("{:.1}", listed.memory_percent),
        virtual_kb: (stat.vsize / 1024).to_string(),
        resident_kb: (stat.rss_bytes().get() / 1024).to_string(),
        terminal: "?".to_string(),
        state: stat.state.to_ascii_uppercase().to_string(),
        started_at: start_clock_time(boot_time, stat.starttime, ticks),
        cpu_time: cpu_time.to_string(),
        command: stat.comm,
    })
}

/// Renders a process start time as local `HH:MM`.
fn start_clock_time(boot_time: u64, starttime_ticks: u64, ticks_per_second: u64) -> String {
    let started = boot_time.saturating_add(starttime_ticks / ticks_per_second);
    match Local.timestamp_opt(started as i64, 0) {
        LocalResult::Single(when) => when.format("%H:%M").to_string(),
        _ => "00:00".to_string(),
    }
}
