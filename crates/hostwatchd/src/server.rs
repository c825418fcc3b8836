//! TCP accept loop for the agent.
//!
//! One independent session task per accepted connection; sessions share
//! nothing mutable beyond the read-only auth gate and the stats engine's
//! internally-locked samplers. Supports graceful shutdown via
//! `CancellationToken`. TLS terminates in the fronting listener; the
//! agent itself speaks plaintext frames.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::auth::AuthGate;
use crate::collector::SnapshotCollector;
use crate::config::AgentConfig;
use crate::engine::StatsEngine;
use crate::procs::ProcessEnumerator;
use crate::session::SessionHandler;

/// Errors that can occur in server operations.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),
}

/// The listening agent: accepts connections and hands each one to its
/// own `SessionHandler`.
pub struct AgentServer {
    listener: TcpListener,
    gate: Arc<AuthGate>,
    engine: Arc<StatsEngine>,
    cancel_token: CancellationToken,
    connection_counter: AtomicU64,
}

impl AgentServer {
    /// Binds the listener and wires the session dependencies from the
    /// configuration.
    pub async fn bind(
        config: &AgentConfig,
        cancel_token: CancellationToken,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.bind_addr,
                source,
            })?;

        let engine = StatsEngine::new(
            SnapshotCollector::new(&config.syslog_path),
            ProcessEnumerator::new(),
        );

        Ok(Self {
            listener,
            gate: Arc::new(AuthGate::new(config.shared_secret.clone())),
            engine: Arc::new(engine),
            cancel_token,
            connection_counter: AtomicU64::new(0),
        })
    }

    /// The address the listener actually bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Accepts connections until the cancellation token fires.
    pub async fn run(&self) -> Result<(), ServerError> {
        info!(addr = %self.local_addr()?, "agent listening");

        loop {
            tokio::select! {
                _ = self.cancel_token.cancelled() => {
                    info!("server shutdown requested");
                    break;
                }

                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let connection =
                                self.connection_counter.fetch_add(1, Ordering::Relaxed);
                            debug!(%peer, connection, "client connected");
                            self.spawn_session(stream, connection);
                        }
                        Err(error) => {
                            error!(%error, "failed to accept connection");
                            // Keep accepting other connections.
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// One task per session. A fault inside the handler is absorbed
    /// there; a panic dies with the task. Neither reaches this loop.
    fn spawn_session(&self, stream: TcpStream, connection: u64) {
        let handler = SessionHandler::new(
            stream,
            Arc::clone(&self.gate),
            Arc::clone(&self.engine),
            connection,
        );
        tokio::spawn(handler.run());
    }
}
