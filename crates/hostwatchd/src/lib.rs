//! Hostwatch Daemon - authenticated host-stats sessions
//!
//! This crate provides the core infrastructure for the hostwatch agent:
//! - `config` - environment-sourced agent configuration
//! - `auth` - shared-secret authentication gate
//! - `procs` - concurrent process-table enumeration
//! - `collector` - host-wide snapshot collection
//! - `engine` - the bundled stats operation
//! - `session` - per-connection protocol state machine
//! - `server` - TCP accept loop
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      hostwatchd                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌─────────────────┐          ┌─────────────────────────┐   │
//! │  │   AgentServer   │          │       StatsEngine       │   │
//! │  │ (TCP listener)  │          │                         │   │
//! │  └────────┬────────┘          │  ProcessEnumerator      │   │
//! │           │ accept()          │  SnapshotCollector      │   │
//! │           ▼                   └───────────▲─────────────┘   │
//! │  ┌─────────────────┐                      │ "stats"         │
//! │  │ SessionHandler  │──────────────────────┘                 │
//! │  │  (per client)   │────▶ AuthGate (shared secret)          │
//! │  └─────────────────┘                                        │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or degrade in-band
//! - A fault in one session never reaches the accept loop

pub mod auth;
pub mod collector;
pub mod config;
pub mod engine;
pub mod procs;
pub mod server;
pub mod session;
