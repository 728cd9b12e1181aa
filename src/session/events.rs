//! Consumer-facing event stream.
//!
//! An [`EventStream`] yields [`StreamEvent`]s in arrival order and ends
//! exactly once, when the dispatcher drops its sender. At most one
//! [`StreamEvent::Failed`] is ever delivered and it is always the last
//! event.

// ============================================================================
// Imports
// ============================================================================

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::mpsc;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Capacity of the event channel.
pub const EVENT_BUFFER: usize = 32;

// ============================================================================
// StreamEvent
// ============================================================================

/// One outcome delivered to the consumer.
#[derive(Debug)]
pub enum StreamEvent {
    /// A raw inbound record, re-emitted verbatim.
    Record(String),
    /// Terminal failure; no further events follow.
    Failed(Error),
}

impl StreamEvent {
    /// Converts the event into a result.
    ///
    /// # Errors
    ///
    /// Returns the carried error for [`StreamEvent::Failed`].
    #[inline]
    pub fn into_result(self) -> Result<String> {
        match self {
            Self::Record(record) => Ok(record),
            Self::Failed(error) => Err(error),
        }
    }

    /// Returns `true` for [`StreamEvent::Failed`].
    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

// ============================================================================
// EventStream
// ============================================================================

/// Ordered, single-consumer stream of [`StreamEvent`]s.
///
/// Dropping the stream makes the producing task stop at its next
/// emission. Pair early abandonment with cancelling the token to also
/// stop it between reads.
#[derive(Debug)]
pub struct EventStream {
    /// Receiving half of the event channel.
    rx: mpsc::Receiver<StreamEvent>,
}

impl EventStream {
    /// Creates a connected sender and stream.
    #[must_use]
    pub(crate) fn channel() -> (mpsc::Sender<StreamEvent>, Self) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        (tx, Self { rx })
    }

    /// Receives the next event, `None` once the stream is closed.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }

    /// Drains the stream into the list of records.
    ///
    /// # Errors
    ///
    /// Returns the terminal error if the stream ended with one.
    pub async fn collect_records(mut self) -> Result<Vec<String>> {
        let mut records = Vec::new();
        while let Some(event) = self.recv().await {
            records.push(event.into_result()?);
        }
        Ok(records)
    }
}

impl Stream for EventStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::StreamExt;
    use tokio_test::{assert_pending, assert_ready, task};

    #[tokio::test]
    async fn test_collect_records_in_order() {
        let (tx, stream) = EventStream::channel();
        tx.send(StreamEvent::Record("a".into())).await.unwrap();
        tx.send(StreamEvent::Record("b".into())).await.unwrap();
        drop(tx);

        assert_eq!(stream.collect_records().await.unwrap(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_collect_records_stops_at_failure() {
        let (tx, stream) = EventStream::channel();
        tx.send(StreamEvent::Record("a".into())).await.unwrap();
        tx.send(StreamEvent::Failed(Error::EmptyResponse))
            .await
            .unwrap();
        drop(tx);

        let err = stream.collect_records().await.unwrap_err();
        assert!(matches!(err, Error::EmptyResponse));
    }

    #[test]
    fn test_stream_pending_until_event() {
        let (tx, mut stream) = EventStream::channel();
        let mut next = task::spawn(stream.next());
        assert_pending!(next.poll());

        tx.try_send(StreamEvent::Record("a".into())).unwrap();
        assert!(next.is_woken());
        let event = assert_ready!(next.poll());
        assert!(matches!(event, Some(StreamEvent::Record(ref r)) if r == "a"));
    }

    #[test]
    fn test_stream_ends_when_sender_dropped() {
        let (tx, mut stream) = EventStream::channel();
        drop(tx);

        let mut next = task::spawn(stream.next());
        assert!(assert_ready!(next.poll()).is_none());
    }

    #[test]
    fn test_into_result() {
        assert_eq!(
            StreamEvent::Record("x".into()).into_result().unwrap(),
            "x"
        );
        let failed = StreamEvent::Failed(Error::ConnectionClosed);
        assert!(failed.is_failure());
        assert!(failed.into_result().is_err());
    }
}
