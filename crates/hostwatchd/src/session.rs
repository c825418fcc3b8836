//! Per-connection protocol state machine.
//!
//! `UNAUTHENTICATED -> AUTHENTICATED -> CLOSED`, with a direct
//! `UNAUTHENTICATED -> CLOSED` edge on auth failure. The first text
//! message is the one permitted authentication attempt; after that,
//! `"stats"` triggers a collection cycle and every other text payload
//! is ignored without a response. Binary frames are ignored in every
//! state.
//!
//! Faults are absorbed at the loop boundary: a failing session is
//! logged and closed, and never reaches the accept loop.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

use hostwatch_protocol::{ClientRequest, Frame, FrameCodec, FrameError, ServerMessage};

use crate::auth::{AuthGate, AuthRejection};
use crate::engine::StatsEngine;

/// Lifecycle of one session. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    Closed,
}

/// Faults that end a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Drives the protocol for a single client connection.
pub struct SessionHandler<T> {
    framed: Framed<T, FrameCodec>,
    gate: Arc<AuthGate>,
    engine: Arc<StatsEngine>,
    state: SessionState,
    connection: u64,
}

impl<T: AsyncRead + AsyncWrite + Unpin> SessionHandler<T> {
    pub fn new(
        transport: T,
        gate: Arc<AuthGate>,
        engine: Arc<StatsEngine>,
        connection: u64,
    ) -> Self {
        Self {
            framed: Framed::new(transport, FrameCodec::new()),
            gate,
            engine,
            state: SessionState::Unauthenticated,
            connection,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the session until the client disconnects, the session is
    /// terminated, or a fault closes it.
    pub async fn run(mut self) {
        debug!(connection = self.connection, "session opened");

        while self.state != SessionState::Closed {
            let frame = match self.framed.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(error)) => {
                    warn!(
                        connection = self.connection,
                        %error,
                        "frame error, closing session"
                    );
                    break;
                }
                None => break,
            };

            match frame {
                Frame::Text(text) => {
                    if let Err(error) = self.handle_text(&text).await {
                        warn!(
                            connection = self.connection,
                            %error,
                            "fault while handling message, closing session"
                        );
                        break;
                    }
                }
                // Tolerated, never interpreted.
                Frame::Binary(_) => {}
                Frame::Close => {
                    self.state = SessionState::Closed;
                }
            }
        }

        self.state = SessionState::Closed;
        // Best-effort close of the underlying transport.
        let _ = self.framed.close().await;
        info!(connection = self.connection, "session closed");
    }

    async fn handle_text(&mut self, text: &str) -> Result<(), SessionError> {
        match self.state {
            SessionState::Unauthenticated => self.handle_credential(text).await,
            SessionState::Authenticated => self.handle_request(text).await,
            SessionState::Closed => Ok(()),
        }
    }

    /// The one permitted authentication attempt. Success flips the
    /// session to authenticated for its whole life; any rejection
    /// notifies the client once and terminates.
    async fn handle_credential(&mut self, text: &str) -> Result<(), SessionError> {
        let outcome = match ClientRequest::classify(text) {
            ClientRequest::Auth { encoded } => self.gate.verify(encoded),
            ClientRequest::Stats | ClientRequest::Other => Err(AuthRejection::MissingPrefix),
        };

        match outcome {
            Ok(()) => {
                self.state = SessionState::Authenticated;
                info!(connection = self.connection, "session authenticated");
                self.send(ServerMessage::auth_success()).await
            }
            Err(rejection) => {
                warn!(
                    connection = self.connection,
                    %rejection,
                    "authentication rejected"
                );
                self.send(ServerMessage::auth_failure()).await?;
                self.state = SessionState::Closed;
                Ok(())
            }
        }
    }

    async fn handle_request(&mut self, text: &str) -> Result<(), SessionError> {
        match ClientRequest::classify(text) {
            ClientRequest::Stats => {
                debug!(connection = self.connection, "stats requested");
                let report = self.engine.collect_report().await;
                self.send(ServerMessage::stats(report)).await
            }
            // Unrecognized traffic after authentication is dropped
            // without a response; the session stays open.
            ClientRequest::Auth { .. } | ClientRequest::Other => Ok(()),
        }
    }

    async fn send(&mut self, message: ServerMessage) -> Result<(), SessionError> {
        let json = message.to_json()?;
        self.framed.send(Frame::Text(json)).await?;
        Ok(())
    }
}
