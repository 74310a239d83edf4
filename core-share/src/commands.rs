//! # Command Dispatch
//!
//! Entry point for calls from the scripting runtime. Each call names a
//! command, carries a JSON argument array and the callback channel of that
//! call.
//!
//! | command        | args            | ack                          |
//! |----------------|-----------------|------------------------------|
//! | `setVerbosity` | `[level 0..=3]` | ok                           |
//! | `init`         | `[]`            | ok (after ingesting the current event) |
//! | `setHandler`   | `[]`            | no result, keep open         |
//! | `setLogger`    | `[]`            | no result, keep open         |
//! | `load`         | `[{"uri": …}]`  | pending; one reply later     |
//! | `exit`         | `[]`            | ok                           |
//!
//! Malformed arguments produce a failure ack, a warning, and no state change.
//! Unknown commands are "not handled".

use bridge_traits::{
    BridgeMessage, ContentReference, LogLevel, MessagePayload, MessageStatus, ScriptChannel,
};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::{Result, ShareError};
use crate::session::ShareSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    SetVerbosity,
    Init,
    SetHandler,
    SetLogger,
    Load,
    Exit,
}

impl Command {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "setVerbosity" => Some(Self::SetVerbosity),
            "init" => Some(Self::Init),
            "setHandler" => Some(Self::SetHandler),
            "setLogger" => Some(Self::SetLogger),
            "load" => Some(Self::Load),
            "exit" => Some(Self::Exit),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::SetVerbosity => "setVerbosity",
            Self::Init => "init",
            Self::SetHandler => "setHandler",
            Self::SetLogger => "setLogger",
            Self::Load => "load",
            Self::Exit => "exit",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Acknowledgment of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAck {
    Ok,
    /// Accepted without a value. With `keep_open` the call's channel stays
    /// subscribed.
    NoResult { keep_open: bool },
    /// Accepted; the single reply arrives later on the call's channel.
    Pending,
    Failure(String),
    NotHandled,
}

impl CommandAck {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok | Self::NoResult { .. } | Self::Pending)
    }

    /// The message a host sends back on the call's channel for this ack, and
    /// whether the channel stays open. `None` when nothing is sent now.
    pub fn to_message(&self) -> Option<(BridgeMessage, bool)> {
        match self {
            Self::Ok => Some((
                BridgeMessage {
                    status: MessageStatus::Ok,
                    payload: MessagePayload::Empty,
                },
                false,
            )),
            Self::NoResult { keep_open } => Some((BridgeMessage::no_result(), *keep_open)),
            Self::Failure(reason) => Some((BridgeMessage::error(reason.clone()), false)),
            Self::Pending | Self::NotHandled => None,
        }
    }
}

/// Routes scripting-runtime commands onto a [`ShareSession`].
#[derive(Clone)]
pub struct CommandDispatcher {
    session: ShareSession,
}

impl CommandDispatcher {
    pub fn new(session: ShareSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &ShareSession {
        &self.session
    }

    pub async fn execute(
        &self,
        action: &str,
        args: &[Value],
        channel: Arc<dyn ScriptChannel>,
    ) -> CommandAck {
        self.session.log(
            LogLevel::Debug,
            &format!(
                "execute() called with action: {} and options: {}",
                action,
                Value::Array(args.to_vec())
            ),
        );

        let Some(command) = Command::parse(action) else {
            self.session.log(
                LogLevel::Debug,
                &format!("execute() did not recognize this action: {}", action),
            );
            return CommandAck::NotHandled;
        };

        let result = match command {
            Command::SetVerbosity => self.set_verbosity(args),
            Command::Init => self.init(args).await,
            Command::SetHandler => self.set_handler(args, channel),
            Command::SetLogger => self.set_logger(args, channel),
            Command::Load => self.load(args, channel).map(|_detached| CommandAck::Pending),
            Command::Exit => self.exit(args),
        };

        match result {
            Ok(ack) => {
                self.session
                    .log(LogLevel::Debug, &format!("{}() -> ok", command));
                ack
            }
            Err(e @ ShareError::InvalidArguments { .. }) => {
                self.session.log(
                    LogLevel::Warn,
                    &format!("{}() -> invalidAction ({})", command, e),
                );
                CommandAck::Failure(e.to_string())
            }
            Err(e) => {
                self.session
                    .log(LogLevel::Warn, &format!("{}() -> {}", command, e));
                CommandAck::Failure(e.to_string())
            }
        }
    }

    fn set_verbosity(&self, args: &[Value]) -> Result<CommandAck> {
        let [level] = args else {
            return Err(ShareError::invalid_arguments(
                Command::SetVerbosity.name(),
                format!("expected 1 argument, got {}", args.len()),
            ));
        };

        let level = level
            .as_i64()
            .ok_or_else(|| {
                ShareError::invalid_arguments(
                    Command::SetVerbosity.name(),
                    format!("level must be an integer, got {}", level),
                )
            })
            .and_then(|n| {
                LogLevel::from_number(n).map_err(|e| {
                    ShareError::invalid_arguments(Command::SetVerbosity.name(), e.to_string())
                })
            })?;

        self.session.set_verbosity(level);
        Ok(CommandAck::Ok)
    }

    async fn init(&self, args: &[Value]) -> Result<CommandAck> {
        expect_no_args(Command::Init, args)?;
        // An enriching record is left to finish on its own task
        self.session.ingest_current().await;
        Ok(CommandAck::Ok)
    }

    fn set_handler(&self, args: &[Value], channel: Arc<dyn ScriptChannel>) -> Result<CommandAck> {
        expect_no_args(Command::SetHandler, args)?;
        self.session.register_handler(channel);
        Ok(CommandAck::NoResult { keep_open: true })
    }

    fn set_logger(&self, args: &[Value], channel: Arc<dyn ScriptChannel>) -> Result<CommandAck> {
        expect_no_args(Command::SetLogger, args)?;
        self.session.register_logger(channel);
        Ok(CommandAck::NoResult { keep_open: true })
    }

    /// Start reading the item described by `args[0]` (`{"uri": …}`).
    ///
    /// The returned task replies once on `channel` with the base64 payload
    /// or the failure reason.
    pub fn load(
        &self,
        args: &[Value],
        channel: Arc<dyn ScriptChannel>,
    ) -> Result<JoinHandle<()>> {
        let [descriptor] = args else {
            return Err(ShareError::invalid_arguments(
                Command::Load.name(),
                format!("expected 1 argument, got {}", args.len()),
            ));
        };

        let uri = descriptor
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ShareError::invalid_arguments(Command::Load.name(), "descriptor has no \"uri\"")
            })?;

        let reference = ContentReference::new(uri);
        let session = self.session.clone();

        Ok(tokio::spawn(async move {
            let reply = match session.resolver().read_for_load(&reference).await {
                Ok(base64) => {
                    session.log(LogLevel::Debug, &format!("load() {} -> ok", reference));
                    BridgeMessage::ok_text(base64)
                }
                Err(e) => {
                    session.log(LogLevel::Debug, &format!("load() {} -> {}", reference, e));
                    BridgeMessage::error(e.to_string())
                }
            };

            if let Err(e) = channel.send(reply, false) {
                warn!(error = %e, "Failed to reply to load()");
            }
        }))
    }

    fn exit(&self, args: &[Value]) -> Result<CommandAck> {
        expect_no_args(Command::Exit, args)?;

        let host = self
            .session
            .config()
            .host_activity
            .as_ref()
            .ok_or_else(|| ShareError::Unavailable("no host activity configured".to_string()))?;

        host.move_to_background()?;
        Ok(CommandAck::Ok)
    }
}

fn expect_no_args(command: Command, args: &[Value]) -> Result<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(ShareError::invalid_arguments(
            command.name(),
            format!("expected no arguments, got {}", args.len()),
        ))
    }
}
