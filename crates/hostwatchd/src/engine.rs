//! The bundled stats operation.
//!
//! One `"stats"` request produces one `StatsReport`: the host snapshot
//! and the full process table are collected concurrently, then the
//! process summary, login data, uptime and log tail are appended in
//! sequence. Degraded data sources surface inside the report, never as
//! protocol errors.

use tracing::{debug, warn};

use hostwatch_protocol::{HostActivity, LoginHistory, StatsReport};

use crate::collector::SnapshotCollector;
use crate::procs::ProcessEnumerator;

pub struct StatsEngine {
    collector: SnapshotCollector,
    enumerator: ProcessEnumerator,
}

impl StatsEngine {
    pub fn new(collector: SnapshotCollector, enumerator: ProcessEnumerator) -> Self {
        Self {
            collector,
            enumerator,
        }
    }

    /// Runs one full collection cycle.
    pub async fn collect_report(&self) -> StatsReport {
        let (snapshot, processes) = tokio::join!(
            self.collector.collect_snapshot(),
            self.enumerator.enumerate()
        );

        let summary = self.collector.summarize_processes().await;
        let users = self.collector.logged_in_users().await;
        let history = match self.collector.recent_logins().await {
            Ok(entries) => LoginHistory::Entries(entries),
            Err(error) => {
                warn!(%error, "login history query failed");
                LoginHistory::Unavailable(format!("Error fetching login history: {error}"))
            }
        };
        let uptime = self.collector.uptime();
        let logtail = self.collector.tail_syslog().await;

        debug!(
            processes = processes.len(),
            users = users.len(),
            "stats report assembled"
        );

        StatsReport(
            snapshot,
            processes,
            HostActivity(summary, users, history, uptime),
            logtail,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_report_bundles_every_section() {
        let engine = StatsEngine::new(
            SnapshotCollector::new("/nonexistent/hostwatch-test.log"),
            ProcessEnumerator::new(),
        );

        let StatsReport(snapshot, processes, HostActivity(summary, _users, _history, uptime), logtail) =
            engine.collect_report().await;

        assert!(snapshot.memory.total > 0);
        assert!(!processes.is_empty());
        assert!(summary.total_processes > 0);
        assert!(uptime.ends_with('m'));
        assert_eq!(logtail, vec!["System log file not found.".to_string()]);
    }
}
