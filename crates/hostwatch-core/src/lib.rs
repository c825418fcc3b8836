//! Hostwatch Core - Shared domain types for host monitoring
//!
//! This crate provides the telemetry types shared between the daemon
//! (hostwatchd) and the wire protocol (hostwatch-protocol): per-process
//! records, the host-wide snapshot, login data, and uptime formatting.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod login;
pub mod process;
pub mod snapshot;
pub mod uptime;

// Re-exports for convenience
pub use login::{parse_login_history, parse_login_table, LoggedInUser, LoginEntry};
pub use process::{ProcessRecord, ProcessSample, ProcessSummary, StateCounts, FIELD_UNAVAILABLE};
pub use snapshot::{DiskStats, LoadAverage, MemoryStats, SystemSnapshot};
pub use uptime::format_uptime;
