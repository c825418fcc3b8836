//! Inbound request classification.
//!
//! The inbound vocabulary is tiny: an `auth:<base64>` credential before
//! authentication and the literal `stats` after it. Anything else is
//! `Other` - a protocol violation pre-auth, silently ignored post-auth.

/// Prefix carrying the base64-encoded credential.
pub const AUTH_PREFIX: &str = "auth:";

/// The snapshot request literal.
pub const STATS_REQUEST: &str = "stats";

/// What one inbound text payload asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRequest<'a> {
    /// `auth:<base64>`; the remainder is the still-encoded credential.
    Auth { encoded: &'a str },
    /// A snapshot request.
    Stats,
    /// Anything else.
    Other,
}

impl<'a> ClientRequest<'a> {
    pub fn classify(text: &'a str) -> Self {
        if let Some(encoded) = text.strip_prefix(AUTH_PREFIX) {
            ClientRequest::Auth { encoded }
        } else if text == STATS_REQUEST {
            ClientRequest::Stats
        } else {
            ClientRequest::Other
        }
    }
}
