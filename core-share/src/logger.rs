//! Verbosity-gated logger.
//!
//! Every message goes to the local diagnostic sink (`tracing`, target
//! [`SHARE_LOG_TARGET`]). When the scripting runtime registered a logger and
//! the level is at or above the current verbosity, the message is also
//! forwarded as `"{level}:{message}"` on the keep-open logger channel. The
//! forwarded line waits in the logger's [`Outbox`] until the session sends it.

use bridge_traits::{BridgeMessage, LogLevel, ScriptChannel};
use core_runtime::logging::SHARE_LOG_TARGET;
use std::sync::Arc;

use crate::outbox::{Outbox, Outgoing};

pub struct GatedLogger {
    verbosity: LogLevel,
    channel: Option<Arc<dyn ScriptChannel>>,
    outbox: Outbox,
}

impl GatedLogger {
    pub fn new(verbosity: LogLevel) -> Self {
        Self {
            verbosity,
            channel: None,
            outbox: Outbox::new(),
        }
    }

    pub fn verbosity(&self) -> LogLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, level: LogLevel) {
        self.verbosity = level;
    }

    pub fn set_channel(&mut self, channel: Arc<dyn ScriptChannel>) {
        self.channel = Some(channel);
    }

    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    /// Forget the logger channel and restore `verbosity`.
    pub fn reset(&mut self, verbosity: LogLevel) {
        self.verbosity = verbosity;
        self.channel = None;
    }

    /// Forwarded lines recorded since the last call, oldest first.
    pub fn take_outgoing(&mut self) -> Outbox {
        self.outbox.take()
    }

    pub fn log(&mut self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(target: SHARE_LOG_TARGET, "{}", message),
            LogLevel::Info => tracing::info!(target: SHARE_LOG_TARGET, "{}", message),
            LogLevel::Warn => tracing::warn!(target: SHARE_LOG_TARGET, "{}", message),
            LogLevel::Error => tracing::error!(target: SHARE_LOG_TARGET, "{}", message),
        }

        if level < self.verbosity {
            return;
        }

        if let Some(channel) = &self.channel {
            let line = format!("{}:{}", level.as_number(), message);
            self.outbox
                .push(Outgoing::new(channel.clone(), BridgeMessage::ok_text(line), true));
        }
    }

    pub fn debug(&mut self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&mut self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&mut self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&mut self, message: &str) {
        self.log(LogLevel::Error, message);
    }
}

impl Default for GatedLogger {
    fn default() -> Self {
        Self::new(LogLevel::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::MessagePayload;
    use std::sync::Mutex;

    #[derive(Default)]
    struct LineSink {
        lines: Mutex<Vec<String>>,
    }

    impl ScriptChannel for LineSink {
        fn send(&self, message: BridgeMessage, keep_open: bool) -> BridgeResult<()> {
            assert!(keep_open);
            if let MessagePayload::Text(line) = message.payload {
                self.lines.lock().unwrap().push(line);
            }
            Ok(())
        }
    }

    #[test]
    fn test_gating_by_verbosity() {
        let sink = Arc::new(LineSink::default());
        let mut logger = GatedLogger::default();
        logger.set_channel(sink.clone());
        logger.set_verbosity(LogLevel::Warn);

        logger.log(LogLevel::Info, "x");
        logger.log(LogLevel::Warn, "x");
        logger.error("boom");
        assert!(sink.lines.lock().unwrap().is_empty());

        logger.take_outgoing().send_all();
        assert_eq!(*sink.lines.lock().unwrap(), vec!["2:x", "3:boom"]);
    }

    #[test]
    fn test_no_channel_is_local_only() {
        let mut logger = GatedLogger::new(LogLevel::Debug);
        assert!(!logger.has_channel());
        logger.debug("nobody listening");
        assert!(logger.take_outgoing().is_empty());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut logger = GatedLogger::new(LogLevel::Error);
        logger.set_channel(Arc::new(LineSink::default()));

        logger.reset(LogLevel::Info);
        assert_eq!(logger.verbosity(), LogLevel::Info);
        assert!(!logger.has_channel());
    }
}
