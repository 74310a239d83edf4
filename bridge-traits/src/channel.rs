//! Scripting Runtime Channel
//!
//! Carries records, log lines and command replies across the boundary into
//! the application's scripting layer.

use serde_json::Value;

use crate::error::Result;

/// Status attached to a message crossing the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStatus {
    Ok,
    Error,
    /// Acknowledges a subscription without carrying a value.
    NoResult,
}

/// Message body.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePayload {
    Empty,
    Text(String),
    Json(Value),
}

/// A single message sent to the scripting runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeMessage {
    pub status: MessageStatus,
    pub payload: MessagePayload,
}

impl BridgeMessage {
    pub fn ok_json(value: Value) -> Self {
        Self {
            status: MessageStatus::Ok,
            payload: MessagePayload::Json(value),
        }
    }

    pub fn ok_text(text: impl Into<String>) -> Self {
        Self {
            status: MessageStatus::Ok,
            payload: MessagePayload::Text(text.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: MessageStatus::Error,
            payload: MessagePayload::Text(message.into()),
        }
    }

    pub fn no_result() -> Self {
        Self {
            status: MessageStatus::NoResult,
            payload: MessagePayload::Empty,
        }
    }
}

/// A callback channel registered by the scripting runtime.
///
/// With `keep_open` the channel stays subscribed for further messages (a
/// standing subscription); otherwise the message is the single reply.
///
/// `send` is called with the core's session lock released, so an
/// implementation may call back into the core (log, run a command).
pub trait ScriptChannel: Send + Sync {
    fn send(&self, message: BridgeMessage, keep_open: bool) -> Result<()>;
}
