//! Outbound wire messages.
//!
//! Everything the agent sends is a JSON 2-element array `[tag, payload]`
//! with `tag` either `"auth"` or `"stats"`. The stats payload is itself
//! a fixed-shape nested array; the tuple structs below pin that shape at
//! the type level.

use serde::ser::{SerializeTuple, Serializer};
use serde::Serialize;

use hostwatch_core::{LoggedInUser, LoginEntry, ProcessRecord, ProcessSummary, SystemSnapshot};

/// Result of the authentication handshake as reported to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    Success,
    Failure,
}

/// Login history as it crosses the wire: the entry list on success, a
/// human-readable reason in place of the list when the accounting query
/// failed. Degradation stays in-band; it is never a protocol error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LoginHistory {
    Entries(Vec<LoginEntry>),
    Unavailable(String),
}

/// `[summary, users, history, uptime]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostActivity(
    pub ProcessSummary,
    pub Vec<LoggedInUser>,
    pub LoginHistory,
    pub String,
);

/// `[snapshot, processes, activity, logtail]` - the full payload of one
/// `"stats"` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport(
    pub SystemSnapshot,
    pub Vec<ProcessRecord>,
    pub HostActivity,
    pub Vec<String>,
);

/// A complete outbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Auth(AuthStatus),
    Stats(Box<StatsReport>),
}

impl ServerMessage {
    pub fn auth_success() -> Self {
        ServerMessage::Auth(AuthStatus::Success)
    }

    pub fn auth_failure() -> Self {
        ServerMessage::Auth(AuthStatus::Failure)
    }

    pub fn stats(report: StatsReport) -> Self {
        ServerMessage::Stats(Box::new(report))
    }

    /// Encodes the message into the JSON text carried by a text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Serialize for ServerMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut pair = serializer.serialize_tuple(2)?;
        match self {
            ServerMessage::Auth(status) => {
                pair.serialize_element("auth")?;
                pair.serialize_element(status)?;
            }
            ServerMessage::Stats(report) => {
                pair.serialize_element("stats")?;
                pair.serialize_element(report)?;
            }
        }
        pair.end()
    }
}
