//! # Pipeline Event Bus
//!
//! Broadcasts what the ingestion pipeline did with each share event using
//! `tokio::sync::broadcast`. Hosts subscribe for diagnostics; tests subscribe
//! to observe ordering without scraping logs.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ ShareSession ├──────────────>│           │     subscribe    ┌────────────┐
//! └──────────────┘               │ EventBus  ├─────────────────>│ Subscriber │
//! ┌──────────────┐     emit      │ (broadcast│                  └────────────┘
//! │ Enrichment   ├──────────────>│  channel) │
//! └──────────────┘               └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, PipelineEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(100);
//! let mut stream = bus.subscribe();
//!
//! bus.emit(PipelineEvent::Flushed { count: 2 }).ok();
//! assert_eq!(stream.recv().await.unwrap(), PipelineEvent::Flushed { count: 2 });
//! # }
//! ```
//!
//! ## Error Handling
//!
//! `emit` fails when nobody is subscribed; the pipeline ignores that case.
//! Slow subscribers receive `RecvError::Lagged(n)` and can keep reading.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use uuid::Uuid;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Something the ingestion pipeline did.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PipelineEvent {
    /// A share event passed dedup and became a record.
    Accepted {
        record_id: Uuid,
        dedup_key: String,
    },
    /// A share event was recognised as a repeat delivery and dropped.
    DuplicateDiscarded { dedup_key: String },
    /// A record was buffered because no handler is registered yet.
    Buffered { record_id: Uuid, pending: usize },
    /// A record crossed the boundary to the handler.
    Delivered {
        record_id: Uuid,
        action: String,
        item_count: usize,
    },
    /// The consumer registered its handler.
    HandlerRegistered,
    /// Buffered records were flushed after registration.
    Flushed { count: usize },
    /// Page-text enrichment was started for a record.
    EnrichmentStarted { record_id: Uuid, url: String },
    /// Page-text enrichment finished (with or without content).
    EnrichmentFinished {
        record_id: Uuid,
        content_attached: bool,
    },
    /// Enrichment finished after a reset; the record was not delivered.
    EnrichmentDiscarded { record_id: Uuid },
    /// Session state was cleared.
    SessionReset { discarded: usize },
}

impl PipelineEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            PipelineEvent::Accepted { .. } => "Share event accepted",
            PipelineEvent::DuplicateDiscarded { .. } => "Duplicate share event discarded",
            PipelineEvent::Buffered { .. } => "Record buffered until a handler registers",
            PipelineEvent::Delivered { .. } => "Record delivered",
            PipelineEvent::HandlerRegistered => "Handler registered",
            PipelineEvent::Flushed { .. } => "Pending records flushed",
            PipelineEvent::EnrichmentStarted { .. } => "Page text enrichment started",
            PipelineEvent::EnrichmentFinished { .. } => "Page text enrichment finished",
            PipelineEvent::EnrichmentDiscarded { .. } => "Enrichment result discarded",
            PipelineEvent::SessionReset { .. } => "Session reset",
        }
    }

    /// The record this event is about, if any.
    pub fn record_id(&self) -> Option<Uuid> {
        match self {
            PipelineEvent::Accepted { record_id, .. }
            | PipelineEvent::Buffered { record_id, .. }
            | PipelineEvent::Delivered { record_id, .. }
            | PipelineEvent::EnrichmentStarted { record_id, .. }
            | PipelineEvent::EnrichmentFinished { record_id, .. }
            | PipelineEvent::EnrichmentDiscarded { record_id } => Some(*record_id),
            _ => None,
        }
    }
}

/// Central event bus for pipeline events.
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PipelineEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all current subscribers.
    ///
    /// Returns the number of subscribers that received it, or an error when
    /// there are none.
    pub fn emit(&self, event: PipelineEvent) -> Result<usize, SendError<PipelineEvent>> {
        self.sender.send(event)
    }

    /// Subscribes to events published from now on.
    pub fn subscribe(&self) -> Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Receiver wrapper that skips events not matching a predicate.
pub struct EventStream {
    receiver: Receiver<PipelineEvent>,
    filter: Option<Box<dyn Fn(&PipelineEvent) -> bool + Send + Sync>>,
}

impl EventStream {
    pub fn new(receiver: Receiver<PipelineEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only yield events for which `predicate` returns true.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&PipelineEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next matching event.
    pub async fn recv(&mut self) -> Result<PipelineEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Returns the next matching event if one is already queued.
    pub fn try_recv(&mut self) -> Option<PipelineEvent> {
        while let Ok(event) = self.receiver.try_recv() {
            if self.matches(&event) {
                return Some(event);
            }
        }
        None
    }

    fn matches(&self, event: &PipelineEvent) -> bool {
        self.filter.as_ref().map_or(true, |f| f(event))
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus.emit(PipelineEvent::HandlerRegistered).is_err());
    }

    #[tokio::test]
    async fn test_event_emission_with_subscribers() {
        let bus = EventBus::new(10);
        let mut sub = bus.subscribe();

        let event = PipelineEvent::Delivered {
            record_id: Uuid::new_v4(),
            action: "SEND".to_string(),
            item_count: 1,
        };

        assert_eq!(bus.emit(event.clone()).unwrap(), 1);
        assert_eq!(sub.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|e| matches!(e, PipelineEvent::Flushed { .. }));

        bus.emit(PipelineEvent::HandlerRegistered).ok();
        bus.emit(PipelineEvent::Flushed { count: 3 }).ok();

        assert_eq!(stream.recv().await.unwrap(), PipelineEvent::Flushed { count: 3 });
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = EventBus::new(10);
        let mut stream = EventStream::new(bus.subscribe());
        assert!(stream.try_recv().is_none());
    }

    #[test]
    fn test_record_id_accessor() {
        let id = Uuid::new_v4();
        let event = PipelineEvent::EnrichmentDiscarded { record_id: id };
        assert_eq!(event.record_id(), Some(id));
        assert_eq!(PipelineEvent::Flushed { count: 0 }.record_id(), None);
        assert_eq!(event.description(), "Enrichment result discarded");
    }

    #[test]
    fn test_event_serialization() {
        let event = PipelineEvent::SessionReset { discarded: 3 };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"SessionReset\""));
        let back: PipelineEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
