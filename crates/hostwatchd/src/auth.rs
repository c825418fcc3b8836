//! Shared-secret authentication gate.
//!
//! Every session presents exactly one credential before any snapshot
//! data is released: a text message `auth:<base64>` whose decoded
//! payload must match the configured shared secret byte for byte. The
//! gate is constructed with the secret at startup and never consults
//! the environment mid-request.
//!
//! The rejection reason is typed so the operator log can tell a typo
//! from a probe; the client only ever sees the uniform
//! `["auth","failure"]` message.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Why a credential was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthRejection {
    #[error("first message is missing the auth prefix")]
    MissingPrefix,

    #[error("credential is not valid base64")]
    InvalidBase64,

    #[error("credential decoded to non-UTF-8 bytes")]
    InvalidUtf8,

    #[error("credential does not match the shared secret")]
    WrongSecret,
}

/// Validates session credentials against the process-wide shared secret.
///
/// Safe to share across sessions: the secret is read-only after
/// construction.
#[derive(Debug)]
pub struct AuthGate {
    secret: String,
}

impl AuthGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Checks one still-encoded credential (the remainder after the
    /// `auth:` prefix).
    pub fn verify(&self, encoded: &str) -> Result<(), AuthRejection> {
        let decoded = BASE64
            .decode(encoded)
            .map_err(|_| AuthRejection::InvalidBase64)?;
        let credential = String::from_utf8(decoded).map_err(|_| AuthRejection::InvalidUtf8)?;

        if credential == self.secret {
            Ok(())
        } else {
            Err(AuthRejection::WrongSecret)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(credential: &str) -> String {
        BASE64.encode(credential)
    }

    #[test]
    fn test_correct_secret_accepted() {
        let gate = AuthGate::new("hunter2");
        assert_eq!(gate.verify(&encode("hunter2")), Ok(()));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let gate = AuthGate::new("hunter2");
        assert_eq!(
            gate.verify(&encode("hunter3")),
            Err(AuthRejection::WrongSecret)
        );
    }

    #[test]
    fn test_secret_comparison_is_exact() {
        let gate = AuthGate::new("hunter2");
        assert_eq!(
            gate.verify(&encode("hunter2 ")),
            Err(AuthRejection::WrongSecret)
        );
        assert_eq!(
            gate.verify(&encode("Hunter2")),
            Err(AuthRejection::WrongSecret)
        );
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let gate = AuthGate::new("hunter2");
        assert_eq!(
            gate.verify("!!!not base64!!!"),
            Err(AuthRejection::InvalidBase64)
        );
    }

    #[test]
    fn test_non_utf8_credential_rejected() {
        let gate = AuthGate::new("hunter2");
        let encoded = BASE64.encode([0xff, 0xfe, 0xfd]);
        assert_eq!(gate.verify(&encoded), Err(AuthRejection::InvalidUtf8));
    }

    #[test]
    fn test_empty_credential_is_wrong_not_malformed() {
        // "auth:" with nothing after it decodes cleanly to the empty
        // string, which simply fails the comparison.
        let gate = AuthGate::new("hunter2");
        assert_eq!(gate.verify(""), Err(AuthRejection::WrongSecret));
    }

    #[test]
    fn test_rejection_reasons_have_distinct_messages() {
        let reasons = [
            AuthRejection::MissingPrefix,
            AuthRejection::InvalidBase64,
            AuthRejection::InvalidUtf8,
            AuthRejection::WrongSecret,
        ];
        for (i, a) in reasons.iter().enumerate() {
            for b in reasons.iter().skip(i + 1) {
                assert_ne!(a.to_string(), b.to_string());
            }
        }
    }
}
