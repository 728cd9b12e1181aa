//! Streaming dispatcher.
//!
//! Drives one turn over an established [`Connection`]: handshake, turn
//! request, then the read loop that classifies records and forwards them
//! to the [`EventStream`](super::EventStream).
//!
//! # State Machine
//!
//! ```text
//! Connecting → Handshaking → AwaitingTurnAck → Streaming → Terminated
//! ```
//!
//! # Cancellation
//!
//! The token is checked before the handshake and before every read. An
//! in-flight read or write is not interrupted; it finishes or times out
//! first.

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{HANDSHAKE_RECORD, KEEP_ALIVE_RECORD, RecordKind, classify};
use crate::transport::{Connection, Transport};

use super::config::{KeepAlive, unix_now};
use super::events::StreamEvent;

// ============================================================================
// SessionState
// ============================================================================

/// Progress of one stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Dialing the endpoint.
    Connecting,
    /// Negotiating the protocol.
    Handshaking,
    /// Turn request sent, no frame read yet.
    AwaitingTurnAck,
    /// Reading and forwarding records.
    Streaming,
    /// Loop exited.
    Terminated(Termination),
}

/// How a stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Terminal success record forwarded.
    Completed,
    /// One error event emitted.
    Failed,
    /// Token cancelled; no error emitted.
    Cancelled,
    /// Consumer dropped the event stream.
    Abandoned,
}

// ============================================================================
// Handshake
// ============================================================================

/// Negotiates the protocol on a fresh connection.
///
/// Sends the negotiation record, reads one acknowledgement frame without
/// interpreting it, then sends a keep-alive.
///
/// # Errors
///
/// Propagates any write or read failure unchanged.
pub async fn handshake<T: Transport>(connection: &mut Connection<T>) -> Result<()> {
    connection.write_record(HANDSHAKE_RECORD).await?;
    let _ack = connection.read_frame().await?;
    connection.write_record(KEEP_ALIVE_RECORD).await?;
    Ok(())
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Single-turn dispatcher owning the connection and the event sender.
pub struct Dispatcher<T: Transport> {
    /// Exclusive connection; released when the run ends.
    connection: Connection<T>,
    /// Sending half of the event stream.
    events: mpsc::Sender<StreamEvent>,
    /// External cancellation.
    cancel: CancellationToken,
    /// Keep-alive schedule.
    keep_alive: KeepAlive,
    /// Source of the current UNIX second.
    clock: fn() -> u64,
    /// Current state.
    state: SessionState,
}

impl<T: Transport> Dispatcher<T> {
    /// Creates a dispatcher for an established connection.
    #[must_use]
    pub fn new(
        connection: Connection<T>,
        events: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
        keep_alive: KeepAlive,
    ) -> Self {
        Self {
            connection,
            events,
            cancel,
            keep_alive,
            clock: unix_now,
            state: SessionState::Connecting,
        }
    }

    /// Replaces the wall clock used by the keep-alive schedule.
    #[inline]
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    /// Runs the turn to completion.
    ///
    /// `build_turn` is invoked after the handshake and must return the
    /// serialized turn request. Every failure is emitted as exactly one
    /// [`StreamEvent::Failed`]. The event sender is dropped and the
    /// connection closed on every exit path.
    pub async fn run<F>(mut self, build_turn: F) -> Termination
    where
        F: FnOnce() -> Result<String>,
    {
        let termination = match self.drive(build_turn).await {
            Ok(termination) => termination,
            Err(error) => {
                warn!(error = %error, state = ?self.state, "Stream failed");
                let _ = self.events.send(StreamEvent::Failed(error)).await;
                Termination::Failed
            }
        };
        self.transition(SessionState::Terminated(termination));

        let Self {
            connection, events, ..
        } = self;
        drop(events);
        connection.close().await;

        termination
    }

    async fn drive<F>(&mut self, build_turn: F) -> Result<Termination>
    where
        F: FnOnce() -> Result<String>,
    {
        if self.cancel.is_cancelled() {
            return Ok(Termination::Cancelled);
        }

        self.transition(SessionState::Handshaking);
        handshake(&mut self.connection).await?;

        let turn = build_turn()?;
        self.connection.write_record(&turn).await?;
        self.transition(SessionState::AwaitingTurnAck);

        loop {
            if self.cancel.is_cancelled() {
                debug!("Stream cancelled");
                return Ok(Termination::Cancelled);
            }

            let records = self.connection.read_frame().await?;
            if self.state == SessionState::AwaitingTurnAck {
                self.transition(SessionState::Streaming);
            }

            if self.keep_alive.is_due((self.clock)()) {
                self.connection.write_record(KEEP_ALIVE_RECORD).await?;
            }

            for record in records {
                if record.is_empty() {
                    continue;
                }

                let completed = match classify(&record)? {
                    RecordKind::Failed { value, message } => {
                        return Err(Error::backend(value, message));
                    }
                    RecordKind::Completed => true,
                    RecordKind::Payload => false,
                };

                if self.events.send(StreamEvent::Record(record)).await.is_err() {
                    debug!("Event stream dropped by consumer");
                    return Ok(Termination::Abandoned);
                }

                if completed {
                    return Ok(Termination::Completed);
                }
            }
        }
    }

    #[inline]
    fn transition(&mut self, state: SessionState) {
        trace!(from = ?self.state, to = ?state, "State transition");
        self.state = state;
    }
}

// ============================================================================
// Tests
// ============================================================================
