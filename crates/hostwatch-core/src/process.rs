//! Per-process records and the process-state summary.
//!
//! A `ProcessRecord` is one row of the process table as reported to the
//! client. Inspection is all-or-nothing: when a process disappears (or
//! denies access, or is a zombie) between listing and inspection, the
//! whole row degrades to the `Unavailable` variant - a record never
//! mixes sampled values with placeholders.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Placeholder reported for every field of an unavailable record.
pub const FIELD_UNAVAILABLE: &str = "N/A";

/// Wire field names, in serialization order.
const RECORD_FIELDS: [&str; 11] = [
    "user", "pid", "cpu", "memory", "vsz", "rss", "tty", "stat", "start", "time", "command",
];

/// Fully-sampled metrics for one process.
///
/// String fields carry pre-rendered values: percentages with one decimal,
/// sizes in kibibytes, start time as local `HH:MM`, cumulative CPU time
/// in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessSample {
    #[serde(rename = "user")]
    pub owner: String,
    pub pid: u32,
    #[serde(rename = "cpu")]
    pub cpu_percent: String,
    #[serde(rename = "memory")]
    pub memory_percent: String,
    #[serde(rename = "vsz")]
    pub virtual_kb: String,
    #[serde(rename = "rss")]
    pub resident_kb: String,
    /// Controlling terminal. Always reported as `"?"`.
    #[serde(rename = "tty")]
    pub terminal: String,
    /// Single uppercase kernel state letter.
    #[serde(rename = "stat")]
    pub state: String,
    #[serde(rename = "start")]
    pub started_at: String,
    #[serde(rename = "time")]
    pub cpu_time: String,
    pub command: String,
}

/// One row of the process table: either fully sampled or fully unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessRecord {
    Sampled(ProcessSample),
    Unavailable,
}

impl ProcessRecord {
    /// Returns true if this row is the all-placeholder fallback.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ProcessRecord::Unavailable)
    }
}

impl Serialize for ProcessRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ProcessRecord::Sampled(sample) => sample.serialize(serializer),
            ProcessRecord::Unavailable => {
                let mut row = serializer.serialize_struct("ProcessSample", RECORD_FIELDS.len())?;
                for field in RECORD_FIELDS {
                    row.serialize_field(field, FIELD_UNAVAILABLE)?;
                }
                row.end()
            }
        }
    }
}

/// Counts of processes per lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateCounts {
    pub running: u32,
    pub sleeping: u32,
    pub stopped: u32,
    pub zombie: u32,
    pub idle: u32,
    pub other: u32,
}

impl StateCounts {
    /// Buckets one kernel state letter.
    ///
    /// `R` running, `S` sleeping, `T` stopped, `Z` zombie, `I` idle.
    /// Everything else (`D` disk sleep, `t` tracing stop, `X` dead, ...)
    /// lands in `other`.
    pub fn record(&mut self, state: char) {
        match state {
            'R' => self.running += 1,
            'S' => self.sleeping += 1,
            'T' => self.stopped += 1,
            'Z' => self.zombie += 1,
            'I' => self.idle += 1,
            _ => self.other += 1,
        }
    }
}

/// Histogram of the process table at one point in time.
///
/// `total_processes` counts the listing; the state buckets count the
/// processes still alive when their state was read. A process that exits
/// between listing and classification stays in the total but in no bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    pub total_processes: usize,
    pub states: StateCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProcessSample {
        ProcessSample {
            owner: "root".to_string(),
            pid: 42,
            cpu_percent: "1.5".to_string(),
            memory_percent: "0.3".to_string(),
            virtual_kb: "10240".to_string(),
            resident_kb: "2048".to_string(),
            terminal: "?".to_string(),
            state: "S".to_string(),
            started_at: "09:15".to_string(),
            cpu_time: "12.34".to_string(),
            command: "init".to_string(),
        }
    }

    #[test]
    fn test_sampled_record_uses_wire_field_names() {
        let value = serde_json::to_value(ProcessRecord::Sampled(sample())).unwrap();
        let row = value.as_object().unwrap();

        assert_eq!(row.len(), RECORD_FIELDS.len());
        for field in RECORD_FIELDS {
            assert!(row.contains_key(field), "missing wire field {field}");
        }
        assert_eq!(row.get("user").unwrap(), "root");
        assert_eq!(row.get("pid").unwrap(), 42);
        assert_eq!(row.get("tty").unwrap(), "?");
    }

    #[test]
    fn test_unavailable_record_is_all_placeholders() {
        let value = serde_json::to_value(ProcessRecord::Unavailable).unwrap();
        let row = value.as_object().unwrap();

        assert_eq!(row.len(), RECORD_FIELDS.len());
        for (field, reported) in row {
            assert_eq!(
                reported, FIELD_UNAVAILABLE,
                "field {field} must degrade with the rest of the record"
            );
        }
    }

    #[test]
    fn test_unavailable_covers_pid_too() {
        // The fallback replaces even the numeric pid with the placeholder
        // string, so a partial record cannot leak through serialization.
        let value = serde_json::to_value(ProcessRecord::Unavailable).unwrap();
        assert_eq!(value.get("pid").unwrap(), FIELD_UNAVAILABLE);
    }

    #[test]
    fn test_state_counts_buckets() {
        let mut counts = StateCounts::default();
        for state in ['R', 'S', 'S', 'T', 'Z', 'I', 'D', 't', 'X'] {
            counts.record(state);
        }

        assert_eq!(counts.running, 1);
        assert_eq!(counts.sleeping, 2);
        assert_eq!(counts.stopped, 1);
        assert_eq!(counts.zombie, 1);
        assert_eq!(counts.idle, 1);
        assert_eq!(counts.other, 3);
    }

    #[test]
    fn test_tracing_stop_is_not_stopped() {
        // Lowercase 't' (tracing stop) is a distinct kernel state and must
        // not be folded into 'T' (stopped by job control).
        let mut counts = StateCounts::default();
        counts.record('t');
        assert_eq!(counts.stopped, 0);
        assert_eq!(counts.other, 1);
    }

    #[test]
    fn test_summary_serialization_shape() {
        let summary = ProcessSummary {
            total_processes: 3,
            states: StateCounts {
                sleeping: 2,
                ..Default::default()
            },
        };
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value.get("total_processes").unwrap(), 3);
        assert_eq!(value.pointer("/states/sleeping").unwrap(), 2);
        assert_eq!(value.pointer("/states/other").unwrap(), 0);
    }
}
