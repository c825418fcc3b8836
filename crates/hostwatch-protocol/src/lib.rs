//! Hostwatch Protocol - Wire protocol for the monitoring agent
//!
//! This crate defines the framed message channel between the agent and a
//! viewer client, and the JSON payloads that cross it:
//!
//! - `frame` - text/binary/close frames with a length-prefixed codec
//! - `message` - outbound `[tag, payload]` 2-arrays (`"auth"`, `"stats"`)
//! - `parse` - inbound request classification

pub mod frame;
pub mod message;
pub mod parse;

pub use frame::{Frame, FrameCodec, FrameError, MAX_FRAME_SIZE};
pub use message::{AuthStatus, HostActivity, LoginHistory, ServerMessage, StatsReport};
pub use parse::{ClientRequest, AUTH_PREFIX, STATS_REQUEST};
