//! Event bus for observing state changes
//!
//! Front ends subscribe to be told when the session changes or a submission
//! completes, instead of polling the stores. The bus is a
//! `tokio::sync::broadcast` channel: emitting never blocks, and events are
//! dropped when nobody listens.
//!
//! # Example
//!
//! ```no_run
//! use libcellar::service::events::{Event, EventBus};
//!
//! # async fn example() {
//! let bus = EventBus::new(100);
//! let mut receiver = bus.subscribe();
//!
//! bus.emit(Event::ReviewDeleted { review_id: 3 });
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("Received: {:?}", event);
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

pub type EventReceiver = broadcast::Receiver<Event>;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: Event) {
        // Err only means there are no subscribers
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Sign-in state changed (login, register, logout, token update)
    SessionChanged {
        authenticated: bool,
        nickname: Option<String>,
    },

    /// A review was created or edited
    ReviewSubmitted {
        review_id: u64,
        wine_id: Option<u64>,
        edited: bool,
    },

    ReviewDeleted {
        review_id: u64,
    },

    /// A review or wine submission failed; the draft is still intact
    SubmissionFailed {
        kind: SubmissionKind,
        error: String,
    },

    WineRegistered {
        wine_id: u64,
        name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Review,
    Wine,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_emission_and_subscription() {
        let bus = EventBus::new(10);
        let mut receiver = bus.subscribe();

        bus.emit(Event::ReviewSubmitted {
            review_id: 5,
            wine_id: Some(7),
            edited: false,
        });

        assert_eq!(
            receiver.recv().await.unwrap(),
            Event::ReviewSubmitted {
                review_id: 5,
                wine_id: Some(7),
                edited: false,
            }
        );
    }

    #[tokio::test]
    async fn test_multiple_subscribers_each_receive() {
        let bus = EventBus::new(10);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.emit(Event::ReviewDeleted { review_id: 1 });

        assert_eq!(first.recv().await.unwrap(), Event::ReviewDeleted { review_id: 1 });
        assert_eq!(second.recv().await.unwrap(), Event::ReviewDeleted { review_id: 1 });
    }

    #[test]
    fn test_emit_without_subscribers_is_noop() {
        let bus = EventBus::new(10);
        bus.emit(Event::WineRegistered {
            wine_id: 1,
            name: "x".to_string(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = Event::SubmissionFailed {
            kind: SubmissionKind::Wine,
            error: "upload failed".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"submission_failed""#));
        assert!(json.contains(r#""kind":"wine""#));

        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
