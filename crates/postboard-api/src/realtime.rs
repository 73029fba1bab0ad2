//! Feed change notifications
//!
//! Post mutations are announced on a `tokio::sync::broadcast` channel. The
//! sender side never blocks and never fails: with no subscribers the event
//! is simply dropped. HTTP clients follow the channel as server-sent events.

use axum::response::sse::Event;
use futures::stream::{self, Stream};
use postboard_core::PostWithCreator;
use serde::Serialize;
use std::convert::Infallible;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

/// Default channel capacity; slow subscribers lag past this many events
pub const DEFAULT_CAPACITY: usize = 256;

/// SSE event name carrying feed changes
pub const SSE_EVENT: &str = "posts";

/// A change to the feed
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FeedEvent {
    Created { post: PostWithCreator },
    Updated { post: PostWithCreator },
    #[serde(rename_all = "camelCase")]
    Deleted { post_id: Uuid },
}

/// Fan-out of feed events to any number of subscribers
#[derive(Clone)]
pub struct FeedNotifier {
    sender: broadcast::Sender<FeedEvent>,
}

impl FeedNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event; returns the number of subscribers reached
    pub fn emit(&self, event: FeedEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::debug!(receivers, "Feed event broadcast");
                receivers
            }
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.sender.subscribe()
    }
}

impl Default for FeedNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Forward a subscription as SSE events until the notifier goes away
///
/// A lagging subscriber skips the events it missed and keeps going.
pub fn sse_stream(
    receiver: broadcast::Receiver<FeedEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(receiver, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => match Event::default().event(SSE_EVENT).json_data(&event) {
                    Ok(sse) => return Some((Ok::<_, Infallible>(sse), rx)),
                    Err(e) => tracing::error!(error = %e, "Failed to serialize feed event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Feed subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_emit_without_subscribers() {
        let notifier = FeedNotifier::default();
        assert_eq!(notifier.emit(FeedEvent::Deleted { post_id: Uuid::new_v4() }), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let notifier = FeedNotifier::default();
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();
        let post_id = Uuid::new_v4();

        assert_eq!(notifier.emit(FeedEvent::Deleted { post_id }), 2);

        for rx in [&mut first, &mut second] {
            match rx.recv().await.unwrap() {
                FeedEvent::Deleted { post_id: id } => assert_eq!(id, post_id),
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[test]
    fn test_event_serialization() {
        let post_id = Uuid::new_v4();
        let json = serde_json::to_value(FeedEvent::Deleted { post_id }).unwrap();

        assert_eq!(json["action"], "deleted");
        assert_eq!(json["postId"], post_id.to_string());
    }

    #[tokio::test]
    async fn test_sse_stream_follows_notifier() {
        let notifier = FeedNotifier::new(4);
        let events = sse_stream(notifier.subscribe());
        futures::pin_mut!(events);

        notifier.emit(FeedEvent::Deleted { post_id: Uuid::new_v4() });
        assert!(matches!(events.next().await, Some(Ok(_))));

        drop(notifier);
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_sse_stream_skips_lagged_events() {
        let notifier = FeedNotifier::new(1);
        let events = sse_stream(notifier.subscribe());
        futures::pin_mut!(events);

        for _ in 0..3 {
            notifier.emit(FeedEvent::Deleted { post_id: Uuid::new_v4() });
        }
        assert!(matches!(events.next().await, Some(Ok(_))));
    }
}
