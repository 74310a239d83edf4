//! Messages produced while the session lock is held.
//!
//! The queue and the logger never call [`ScriptChannel::send`] themselves.
//! They record an [`Outgoing`] message, and the session sends it after the
//! lock is released, in the order it was produced.

use bridge_traits::{BridgeMessage, ScriptChannel};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::warn;

/// One message bound for a scripting-runtime channel.
pub struct Outgoing {
    channel: Arc<dyn ScriptChannel>,
    message: BridgeMessage,
    keep_open: bool,
}

impl Outgoing {
    pub fn new(channel: Arc<dyn ScriptChannel>, message: BridgeMessage, keep_open: bool) -> Self {
        Self {
            channel,
            message,
            keep_open,
        }
    }

    /// Send the message. A closed channel is logged locally.
    pub fn send(self) {
        if let Err(e) = self.channel.send(self.message, self.keep_open) {
            warn!(error = %e, keep_open = self.keep_open, "Failed to send to scripting runtime");
        }
    }
}

/// FIFO of [`Outgoing`] messages.
#[derive(Default)]
pub struct Outbox {
    pending: VecDeque<Outgoing>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outgoing: Outgoing) {
        self.pending.push_back(outgoing);
    }

    pub fn pop(&mut self) -> Option<Outgoing> {
        self.pending.pop_front()
    }

    /// Move every message of `other` to the back of this outbox.
    pub fn append(&mut self, other: &mut Outbox) {
        self.pending.append(&mut other.pending);
    }

    /// Take everything queued so far, leaving this outbox empty.
    pub fn take(&mut self) -> Outbox {
        std::mem::take(self)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Send everything, oldest first.
    pub fn send_all(mut self) {
        while let Some(outgoing) = self.pop() {
            outgoing.send();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{BridgeError, MessagePayload};
    use std::sync::Mutex;

    #[derive(Default)]
    struct LineSink {
        lines: Mutex<Vec<String>>,
    }

    impl ScriptChannel for LineSink {
        fn send(&self, message: BridgeMessage, _keep_open: bool) -> BridgeResult<()> {
            if let MessagePayload::Text(line) = message.payload {
                self.lines.lock().unwrap().push(line);
            }
            Ok(())
        }
    }

    struct ClosedChannel;

    impl ScriptChannel for ClosedChannel {
        fn send(&self, _message: BridgeMessage, _keep_open: bool) -> BridgeResult<()> {
            Err(BridgeError::ChannelClosed("webview gone".to_string()))
        }
    }

    #[test]
    fn test_nothing_is_sent_until_send_all() {
        let sink = Arc::new(LineSink::default());
        let mut outbox = Outbox::new();
        outbox.push(Outgoing::new(sink.clone(), BridgeMessage::ok_text("a"), true));
        outbox.push(Outgoing::new(sink.clone(), BridgeMessage::ok_text("b"), true));

        assert!(sink.lines.lock().unwrap().is_empty());
        assert_eq!(outbox.len(), 2);

        outbox.send_all();
        assert_eq!(*sink.lines.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_append_keeps_order() {
        let sink = Arc::new(LineSink::default());
        let mut first = Outbox::new();
        let mut second = Outbox::new();
        first.push(Outgoing::new(sink.clone(), BridgeMessage::ok_text("1"), true));
        second.push(Outgoing::new(sink.clone(), BridgeMessage::ok_text("2"), true));

        first.append(&mut second);
        assert!(second.is_empty());

        let taken = first.take();
        assert!(first.is_empty());
        taken.send_all();
        assert_eq!(*sink.lines.lock().unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn test_closed_channel_does_not_stop_the_rest() {
        let sink = Arc::new(LineSink::default());
        let mut outbox = Outbox::new();
        outbox.push(Outgoing::new(Arc::new(ClosedChannel), BridgeMessage::ok_text("lost"), true));
        outbox.push(Outgoing::new(sink.clone(), BridgeMessage::ok_text("kept"), true));

        outbox.send_all();
        assert_eq!(*sink.lines.lock().unwrap(), vec!["kept"]);
    }
}
