//! Framed connection over a WebSocket transport.
//!
//! [`Connection`] owns its transport exclusively. It appends the record
//! delimiter to every write, splits every inbound text frame into records
//! and applies separate write and read timeouts.
//!
//! | Operation | Timeout | Failure |
//! |-----------|---------|---------|
//! | [`Connection::write_record`] | 5s | [`Error::WriteTimeout`] |
//! | [`Connection::read_frame`] | 30s | [`Error::ReadTimeout`], [`Error::EmptyResponse`] |

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::protocol::{frame_record, split_records};

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for a framed write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for a framed read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Transport
// ============================================================================

/// Duplex message transport underneath a [`Connection`].
///
/// Implemented for [`WebSocketStream`]; tests supply scripted transports.
#[async_trait]
pub trait Transport: Send {
    /// Sends one message.
    async fn send_message(&mut self, message: Message) -> Result<()>;

    /// Receives the next message, `None` once the stream has ended.
    async fn recv_message(&mut self) -> Option<Result<Message>>;

    /// Closes the transport. Errors are ignored.
    async fn close_transport(&mut self);
}

#[async_trait]
impl<S> Transport for WebSocketStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_message(&mut self, message: Message) -> Result<()> {
        self.send(message).await?;
        Ok(())
    }

    async fn recv_message(&mut self) -> Option<Result<Message>> {
        self.next().await.map(|result| result.map_err(Error::from))
    }

    async fn close_transport(&mut self) {
        if let Err(e) = self.close(None).await {
            trace!(error = %e, "Close handshake failed");
        }
    }
}

// ============================================================================
// Connection
// ============================================================================

/// Record-framed connection to the backend.
pub struct Connection<T: Transport> {
    /// Underlying transport.
    transport: T,
    /// Log traffic at debug level instead of trace.
    debug: bool,
    /// Timeout for each framed write.
    write_timeout: Duration,
    /// Timeout for each framed read.
    read_timeout: Duration,
}

impl<T: Transport> Connection<T> {
    /// Wraps a transport with the default timeouts.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            debug: false,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Enables traffic logging at debug level.
    #[inline]
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Overrides the write and read timeouts.
    #[inline]
    #[must_use]
    pub fn with_timeouts(mut self, write_timeout: Duration, read_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self.read_timeout = read_timeout;
        self
    }

    /// Writes one record followed by the delimiter.
    ///
    /// # Errors
    ///
    /// - [`Error::WriteTimeout`] if the write does not finish in time
    /// - [`Error::WebSocket`] or other transport errors as reported
    pub async fn write_record(&mut self, record: &str) -> Result<()> {
        let framed = frame_record(record);
        if self.debug {
            debug!(record = %framed, "sending");
        } else {
            trace!(record = %framed, "sending");
        }

        timeout(
            self.write_timeout,
            self.transport.send_message(Message::Text(framed.into())),
        )
        .await
        .map_err(|_| Error::write_timeout(self.write_timeout.as_millis() as u64))?
    }

    /// Reads one frame and splits it into records.
    ///
    /// Non-text frames yield an empty list.
    ///
    /// # Errors
    ///
    /// - [`Error::ReadTimeout`] if no frame arrives in time
    /// - [`Error::EmptyResponse`] if the text frame is empty
    /// - [`Error::ConnectionClosed`] if the remote closed the socket
    pub async fn read_frame(&mut self) -> Result<Vec<String>> {
        let message = timeout(self.read_timeout, self.transport.recv_message())
            .await
            .map_err(|_| Error::read_timeout(self.read_timeout.as_millis() as u64))?;

        let text = match message {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(frame))) => {
                debug!(?frame, "WebSocket closed by remote");
                return Err(Error::ConnectionClosed);
            }
            Some(Ok(_)) => return Ok(Vec::new()),
            Some(Err(e)) => return Err(e),
            None => return Err(Error::ConnectionClosed),
        };

        if text.is_empty() {
            return Err(Error::EmptyResponse);
        }

        let records = split_records(text.as_str());
        for record in &records {
            if self.debug {
                debug!(%record, "receiving");
            } else {
                trace!(%record, "receiving");
            }
        }

        Ok(records)
    }

    /// Closes the underlying transport.
    pub async fn close(mut self) {
        self.transport.close_transport().await;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;

    /// Transport replaying a fixed list of inbound messages.
    #[derive(Default)]
    struct Replay {
        inbound: VecDeque<Message>,
        sent: Vec<Message>,
        stall: bool,
    }

    #[async_trait]
    impl Transport for Replay {
        async fn send_message(&mut self, message: Message) -> Result<()> {
            if self.stall {
                std::future::pending::<()>().await;
            }
            self.sent.push(message);
            Ok(())
        }

        async fn recv_message(&mut self) -> Option<Result<Message>> {
            if self.stall {
                std::future::pending::<()>().await;
            }
            self.inbound.pop_front().map(Ok)
        }

        async fn close_transport(&mut self) {}
    }

    fn replay(messages: Vec<Message>) -> Connection<Replay> {
        Connection::new(Replay {
            inbound: messages.into(),
            ..Default::default()
        })
    }

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_WRITE_TIMEOUT.as_secs(), 5);
        assert_eq!(DEFAULT_READ_TIMEOUT.as_secs(), 30);
    }

    #[tokio::test]
    async fn test_write_record_appends_delimiter() {
        let mut connection = replay(Vec::new());
        connection.write_record("{\"type\":6}").await.unwrap();

        assert_eq!(
            connection.transport.sent,
            vec![Message::Text("{\"type\":6}\u{1e}".into())]
        );
    }

    #[tokio::test]
    async fn test_read_frame_splits_records() {
        let mut connection = replay(vec![Message::Text("{\"a\":1}\u{1e}{\"b\":2}\u{1e}".into())]);
        let records = connection.read_frame().await.unwrap();
        assert_eq!(records, vec!["{\"a\":1}", "{\"b\":2}", ""]);
    }

    #[tokio::test]
    async fn test_read_frame_ignores_binary() {
        let mut connection = replay(vec![Message::Binary(vec![1, 2, 3].into())]);
        assert!(connection.read_frame().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_frame_empty_text() {
        let mut connection = replay(vec![Message::Text("".into())]);
        let err = connection.read_frame().await.unwrap_err();
        assert!(matches!(err, Error::EmptyResponse));
    }

    #[tokio::test]
    async fn test_read_frame_close() {
        let mut connection = replay(vec![Message::Close(None)]);
        let err = connection.read_frame().await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));

        let err = connection.read_frame().await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timeout() {
        let mut connection = Connection::new(Replay {
            stall: true,
            ..Default::default()
        });
        let err = connection.read_frame().await.unwrap_err();
        assert!(matches!(err, Error::ReadTimeout { timeout_ms: 30_000 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_timeout() {
        let mut connection = Connection::new(Replay {
            stall: true,
            ..Default::default()
        })
        .with_timeouts(Duration::from_millis(250), DEFAULT_READ_TIMEOUT);
        let err = connection.write_record("{}").await.unwrap_err();
        assert!(matches!(err, Error::WriteTimeout { timeout_ms: 250 }));
    }
}
