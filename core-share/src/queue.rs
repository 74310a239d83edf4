//! # Delivery Queue
//!
//! Handler registration state machine:
//!
//! ```text
//!              register_handler()              enqueue()
//! ┌───────────┐  (flush FIFO once)  ┌───────────────────┐  deliver
//! │ NoHandler ├────────────────────>│ HandlerRegistered ├─────────>
//! └─────┬─────┘                     └─────────┬─────────┘
//!       │ enqueue(): buffer                   │ clear(): reset
//!       ▼                                     ▼
//!   pending FIFO                          NoHandler
//! ```
//!
//! The queue has no locking of its own; the session owns it behind its state
//! lock, which makes append and flush single-writer. Deliveries are recorded
//! in the queue's [`Outbox`] and sent by the session once the lock is
//! released.

use bridge_traits::{BridgeMessage, ScriptChannel};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::model::Record;
use crate::outbox::{Outbox, Outgoing};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    NoHandler,
    HandlerRegistered,
}

/// What `enqueue` did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// Held until a handler registers; `pending` counts the buffer.
    Buffered { pending: usize },
    /// Sent to the registered handler.
    Delivered,
}

pub struct DeliveryQueue {
    handler: Option<Arc<dyn ScriptChannel>>,
    pending: VecDeque<Record>,
    outbox: Outbox,
}

impl DeliveryQueue {
    pub fn new() -> Self {
        Self {
            handler: None,
            pending: VecDeque::new(),
            outbox: Outbox::new(),
        }
    }

    pub fn state(&self) -> HandlerState {
        if self.handler.is_some() {
            HandlerState::HandlerRegistered
        } else {
            HandlerState::NoHandler
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Ids of buffered records in delivery order.
    pub fn pending_ids(&self) -> Vec<Uuid> {
        self.pending.iter().map(|record| record.id).collect()
    }

    pub fn enqueue(&mut self, record: Record) -> Enqueued {
        match &self.handler {
            Some(handler) => {
                if let Some(outgoing) = delivery(handler, &record) {
                    self.outbox.push(outgoing);
                }
                Enqueued::Delivered
            }
            None => {
                self.pending.push_back(record);
                debug!(pending = self.pending.len(), "Record buffered");
                Enqueued::Buffered {
                    pending: self.pending.len(),
                }
            }
        }
    }

    /// Install the handler and flush everything buffered, oldest first.
    ///
    /// Returns the flushed records. A repeated registration replaces the
    /// handler and flushes nothing.
    pub fn register_handler(&mut self, handler: Arc<dyn ScriptChannel>) -> Vec<Record> {
        let flushed: Vec<Record> = self.pending.drain(..).collect();
        for record in &flushed {
            if let Some(outgoing) = delivery(&handler, record) {
                self.outbox.push(outgoing);
            }
        }
        self.handler = Some(handler);
        flushed
    }

    /// Drop the handler and every buffered record; back to `NoHandler`.
    ///
    /// Returns the number of discarded records.
    /// Deliveries recorded since the last call, oldest first.
    pub fn take_outgoing(&mut self) -> Outbox {
        self.outbox.take()
    }

    pub fn clear(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending.clear();
        self.handler = None;
        discarded
    }
}

impl Default for DeliveryQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// One keep-open message per record.
fn delivery(handler: &Arc<dyn ScriptChannel>, record: &Record) -> Option<Outgoing> {
    match record.to_json() {
        Ok(payload) => Some(Outgoing::new(
            handler.clone(),
            BridgeMessage::ok_json(payload),
            true,
        )),
        Err(e) => {
            error!(record_id = %record.id, error = %e, "Failed to serialize record");
            None
        }
    }
}
