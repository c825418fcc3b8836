//! Agent configuration.
//!
//! Read once from the environment at startup and handed to the
//! components that need it; nothing reads the environment mid-request.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Environment variable carrying the shared secret. Required.
pub const SECRET_ENV: &str = "HOSTWATCH_SECRET";

/// Environment variable overriding the listen address.
pub const BIND_ENV: &str = "HOSTWATCH_BIND";

/// Environment variable overriding the system log path.
pub const SYSLOG_ENV: &str = "HOSTWATCH_SYSLOG";

/// Environment variables overriding the TLS material paths.
pub const CERT_ENV: &str = "HOSTWATCH_CERT";
pub const KEY_ENV: &str = "HOSTWATCH_KEY";

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8765";
pub const DEFAULT_SYSLOG_PATH: &str = "/var/log/syslog";
pub const DEFAULT_CERT_PATH: &str = "cert/localhost.crt";
pub const DEFAULT_KEY_PATH: &str = "cert/localhost.key";

/// Agent configuration, fixed for the life of the process.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Address the agent listens on. The agent itself speaks plaintext;
    /// TLS terminates in the fronting listener.
    pub bind_addr: SocketAddr,

    /// Shared secret every session must present once.
    pub shared_secret: String,

    /// System log file served by the log tail; absence is non-fatal.
    pub syslog_path: PathBuf,

    /// Certificate/key pair for the TLS-terminating front end.
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl AgentConfig {
    /// Reads the configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let shared_secret = env::var(SECRET_ENV).unwrap_or_default();
        if shared_secret.is_empty() {
            return Err(ConfigError::MissingSecret);
        }

        let bind_raw = env::var(BIND_ENV).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr { value: bind_raw })?;

        Ok(Self {
            bind_addr,
            shared_secret,
            syslog_path: path_from_env(SYSLOG_ENV, DEFAULT_SYSLOG_PATH),
            cert_path: path_from_env(CERT_ENV, DEFAULT_CERT_PATH),
            key_path: path_from_env(KEY_ENV, DEFAULT_KEY_PATH),
        })
    }
}

fn path_from_env(var: &str, default: &str) -> PathBuf {
    env::var_os(var)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Errors that can occur while reading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{SECRET_ENV} must be set to a non-empty shared secret")]
    MissingSecret,

    #[error("invalid listen address: {value}")]
    InvalidBindAddr { value: String },
}
