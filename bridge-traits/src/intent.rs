//! Share Event Model and Platform Event Source
//!
//! The platform hands the core a share "intent" whose extras are normally
//! looked up reflectively. Here that object is a closed, typed [`ShareEvent`]:
//! every optional platform field is an explicit `Option`, and the fields used
//! purely for recognising repeat deliveries live in [`RawIdentity`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Platform action string for a single-item share.
pub const ACTION_SEND: &str = "android.intent.action.SEND";
/// Platform action string for a multi-item share.
pub const ACTION_SEND_MULTIPLE: &str = "android.intent.action.SEND_MULTIPLE";
/// Platform action string for a view request.
pub const ACTION_VIEW: &str = "android.intent.action.VIEW";

/// Extra-data key names recorded on [`RawIdentity::extra_keys`].
pub mod extra {
    pub const STREAM: &str = "android.intent.extra.STREAM";
    pub const TEXT: &str = "android.intent.extra.TEXT";
    pub const SUBJECT: &str = "android.intent.extra.SUBJECT";
    pub const PREVIEW: &str = "share_screenshot_as_stream";
    pub const EXIT_ON_SENT: &str = "exit_on_sent";
    pub const SERIALIZED_RECORD: &str = "json";
}

/// Kind of share action delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Send,
    SendMultiple,
    View,
    /// Any other platform action, kept verbatim.
    Other(String),
}

impl ActionKind {
    /// Parse a platform action string.
    pub fn from_platform(action: &str) -> Self {
        match action {
            ACTION_SEND => Self::Send,
            ACTION_SEND_MULTIPLE => Self::SendMultiple,
            ACTION_VIEW => Self::View,
            other => Self::Other(other.to_string()),
        }
    }

    /// The raw platform action string.
    pub fn as_platform_str(&self) -> &str {
        match self {
            Self::Send => ACTION_SEND,
            Self::SendMultiple => ACTION_SEND_MULTIPLE,
            Self::View => ACTION_VIEW,
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_platform_str())
    }
}

/// Opaque handle to content owned by the platform storage layer.
///
/// Usually a `content://` or `file://` URI; the core never interprets it and
/// only hands it back to a [`ReferenceResolver`](crate::storage::ReferenceResolver).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentReference(String);

impl ContentReference {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentReference {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Platform fields used only to derive a deduplication key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawIdentity {
    /// Raw platform action string.
    pub action: String,
    /// Primary content reference (the intent data URI), if any.
    pub data: Option<ContentReference>,
    /// String form of the stream-style reference(s), if any.
    pub stream: Option<String>,
    /// Names of the extra-data fields present on the event.
    pub extra_keys: BTreeSet<String>,
}

/// A share event as delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareEvent {
    pub action_kind: ActionKind,
    pub mime_type: Option<String>,
    pub content_references: Vec<ContentReference>,
    pub free_text: Option<String>,
    /// Subject line, used as the title of a shared link.
    pub subject: Option<String>,
    /// Screenshot attached by browsers when sharing a page.
    pub preview_reference: Option<ContentReference>,
    pub exit_on_sent: Option<bool>,
    /// Record JSON already produced by an intermediary share activity.
    pub serialized_record: Option<String>,
    pub raw_identity: RawIdentity,
}

impl ShareEvent {
    /// Create an event with no payload. The raw identity tracks the action.
    pub fn new(action_kind: ActionKind) -> Self {
        let raw_identity = RawIdentity {
            action: action_kind.as_platform_str().to_string(),
            ..RawIdentity::default()
        };

        Self {
            action_kind,
            mime_type: None,
            content_references: Vec::new(),
            free_text: None,
            subject: None,
            preview_reference: None,
            exit_on_sent: None,
            serialized_record: None,
            raw_identity,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Attach stream references; their joined string form becomes the
    /// stream identity.
    pub fn with_content_references<I>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = ContentReference>,
    {
        self.content_references.extend(references);
        let joined = self
            .content_references
            .iter()
            .map(ContentReference::as_str)
            .collect::<Vec<_>>()
            .join(",");
        self.raw_identity.stream = Some(joined);
        self.raw_identity.extra_keys.insert(extra::STREAM.to_string());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.free_text = Some(text.into());
        self.raw_identity.extra_keys.insert(extra::TEXT.to_string());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self.raw_identity.extra_keys.insert(extra::SUBJECT.to_string());
        self
    }

    pub fn with_preview(mut self, reference: ContentReference) -> Self {
        self.preview_reference = Some(reference);
        self.raw_identity.extra_keys.insert(extra::PREVIEW.to_string());
        self
    }

    pub fn with_exit_on_sent(mut self, exit: bool) -> Self {
        self.exit_on_sent = Some(exit);
        self.raw_identity
            .extra_keys
            .insert(extra::EXIT_ON_SENT.to_string());
        self
    }

    pub fn with_serialized_record(mut self, json: impl Into<String>) -> Self {
        self.serialized_record = Some(json.into());
        self.raw_identity
            .extra_keys
            .insert(extra::SERIALIZED_RECORD.to_string());
        self
    }

    pub fn with_data(mut self, reference: ContentReference) -> Self {
        self.raw_identity.data = Some(reference);
        self
    }

    /// Record an extra-data key that carries no typed payload.
    pub fn with_extra_key(mut self, key: impl Into<String>) -> Self {
        self.raw_identity.extra_keys.insert(key.into());
        self
    }
}

/// Source of platform share events.
///
/// Pulled once when the consumer calls `init()` and again whenever the host
/// is notified of a new event.
pub trait PlatformEventSource: Send + Sync {
    /// The event the application is currently holding, if any.
    fn current_event(&self) -> Option<ShareEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kind_round_trips_platform_strings() {
        assert_eq!(ActionKind::from_platform(ACTION_SEND), ActionKind::Send);
        assert_eq!(
            ActionKind::from_platform(ACTION_SEND_MULTIPLE),
            ActionKind::SendMultiple
        );
        assert_eq!(ActionKind::from_platform(ACTION_VIEW), ActionKind::View);

        let other = ActionKind::from_platform("com.example.CUSTOM");
        assert_eq!(other, ActionKind::Other("com.example.CUSTOM".to_string()));
        assert_eq!(other.as_platform_str(), "com.example.CUSTOM");
    }

    #[test]
    fn test_builder_tracks_identity() {
        let event = ShareEvent::new(ActionKind::SendMultiple)
            .with_mime_type("image/png")
            .with_content_references(vec![
                ContentReference::new("content://a"),
                ContentReference::new("content://b"),
            ])
            .with_text("hi");

        assert_eq!(event.raw_identity.action, ACTION_SEND_MULTIPLE);
        assert_eq!(
            event.raw_identity.stream.as_deref(),
            Some("content://a,content://b")
        );
        assert!(event.raw_identity.extra_keys.contains(extra::STREAM));
        assert!(event.raw_identity.extra_keys.contains(extra::TEXT));
        assert_eq!(event.content_references.len(), 2);
    }

    #[test]
    fn test_new_event_has_no_payload() {
        let event = ShareEvent::new(ActionKind::View);
        assert!(event.content_references.is_empty());
        assert!(event.exit_on_sent.is_none());
        assert!(event.raw_identity.extra_keys.is_empty());
    }
}
