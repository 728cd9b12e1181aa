//! Session entry point.
//!
//! A [`Session`] holds the shared configuration and starts one background
//! task per [`Session::ask_stream`] call. Tasks share no mutable state;
//! each owns its own connection.
//!
//! # Example
//!
//! ```no_run
//! use chathub_stream::{Conversation, Session, StreamEvent};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> chathub_stream::Result<()> {
//! let session = Session::builder().cookie("_U", "cookie-value").build()?;
//! let conversation = Conversation::new("conversation-id", "client-id");
//!
//! let mut stream = session.ask_stream(
//!     CancellationToken::new(),
//!     conversation,
//!     "Hello",
//!     "",
//!     "",
//! );
//! while let Some(event) = stream.recv().await {
//!     match event {
//!         StreamEvent::Record(record) => println!("{record}"),
//!         StreamEvent::Failed(error) => return Err(error),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::protocol::TurnRequest;
use crate::transport::connect;

use super::builder::SessionBuilder;
use super::config::SessionConfig;
use super::conversation::Conversation;
use super::dispatcher::{Dispatcher, SessionState};
use super::events::{EventStream, StreamEvent};

// ============================================================================
// Types
// ============================================================================

/// Inputs of one turn.
struct Turn {
    conversation: Conversation,
    prompt: String,
    webpage_context: String,
    image_url: String,
}

// ============================================================================
// Session
// ============================================================================

/// Streaming client for one backend configuration.
///
/// Cheap to clone; clones share the configuration.
#[derive(Clone)]
pub struct Session {
    /// Shared configuration.
    config: Arc<SessionConfig>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.config.endpoint)
            .field("locale", &self.config.locale)
            .field("conversation_style", &self.config.conversation_style)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Session - Public API
// ============================================================================

impl Session {
    /// Creates a configuration builder for the session.
    #[inline]
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Creates a session from an already validated configuration.
    #[inline]
    #[must_use]
    pub(crate) fn new(config: SessionConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Returns the session configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Sends one prompt and streams the backend's records.
    ///
    /// Spawns a task that connects, performs the handshake, sends the turn
    /// request and forwards records until completion, failure or
    /// cancellation. The returned stream closes exactly once when the task
    /// stops. Cancelling `cancel` ends the stream silently at the next
    /// read boundary.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn ask_stream(
        &self,
        cancel: CancellationToken,
        conversation: Conversation,
        prompt: impl Into<String>,
        webpage_context: impl Into<String>,
        image_url: impl Into<String>,
    ) -> EventStream {
        let (tx, stream) = EventStream::channel();
        let turn = Turn {
            conversation,
            prompt: prompt.into(),
            webpage_context: webpage_context.into(),
            image_url: image_url.into(),
        };

        tokio::spawn(stream_turn(Arc::clone(&self.config), cancel, turn, tx));

        stream
    }
}

// ============================================================================
// Background Task
// ============================================================================

/// Connects and dispatches one turn, reporting through `events`.
async fn stream_turn(
    config: Arc<SessionConfig>,
    cancel: CancellationToken,
    turn: Turn,
    events: mpsc::Sender<StreamEvent>,
) {
    debug!(
        state = ?SessionState::Connecting,
        conversation_id = %turn.conversation.conversation_id,
        "Opening stream"
    );

    let connection = match connect(&config, &turn.conversation.sec_access_token).await {
        Ok(connection) => connection,
        Err(error) => {
            warn!(error = %error, "Connect failed");
            let _ = events.send(StreamEvent::Failed(error)).await;
            return;
        }
    };

    if cancel.is_cancelled() {
        debug!("Stream cancelled after connect");
        drop(events);
        connection.close().await;
        return;
    }

    let termination = Dispatcher::new(connection, events, cancel, config.keep_alive)
        .run(|| {
            TurnRequest::build(
                &turn.conversation,
                &turn.prompt,
                &turn.webpage_context,
                &turn.image_url,
                config.turn_options(),
            )
            .to_record()
        })
        .await;

    info!(
        ?termination,
        conversation_id = %turn.conversation.conversation_id,
        "Stream finished"
    );
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::error::Error;

    #[test]
    fn test_session_is_clone() {
        let session = Session::builder().locale("de-DE").build().unwrap();
        let cloned = session.clone();
        assert!(Arc::ptr_eq(&session.config, &cloned.config));
    }

    #[test]
    fn test_debug_hides_cookies() {
        let session = Session::builder().cookie("_U", "secret").build().unwrap();
        let rendered = format!("{session:?}");
        assert!(rendered.contains("endpoint"));
        assert!(!rendered.contains("secret"));
    }

    #[tokio::test]
    async fn test_connect_failure_is_single_event() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let session = Session::builder()
            .endpoint(format!("ws://127.0.0.1:{port}/hub"))
            .connect_timeout(Duration::from_secs(2))
            .build()
            .unwrap();

        let stream = session.ask_stream(
            CancellationToken::new(),
            Conversation::new("c", "p"),
            "hi",
            "",
            "",
        );
        let err = stream.collect_records().await.unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
    }
}
