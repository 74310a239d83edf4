//! # Dedup Key Generator
//!
//! Platform lifecycle quirks can hand the same share event to the core more
//! than once (activity recreation, `init()` after a delivery already
//! happened). Each raw event is reduced to a [`DedupKey`] so the session can
//! recognise a repeat without comparing payloads.
//!
//! ## Key format
//!
//! - Re-delivered serialized record: `{action}|json:{sha256(json)}`
//! - Otherwise: `{action}`, then `|data:{primary reference}` and
//!   `|type:{mime}` when present, then a fallback component:
//!   `|stream:{sha256(stream)}` when stream references exist, else
//!   `|extras:{sha256(sorted extra key names)}`.
//!
//! The extras fallback is weak: two different text shares with the same set
//! of extra keys and no stream collide. That risk is accepted.

use bridge_traits::ShareEvent;
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable identity of one share event occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey(String);

impl DedupKey {
    /// Derive the key for an event. Deterministic; no I/O.
    pub fn for_event(event: &ShareEvent) -> Self {
        let identity = &event.raw_identity;

        if let Some(json) = &event.serialized_record {
            return Self(format!("{}|json:{}", identity.action, sha256_hex(json)));
        }

        let mut key = identity.action.clone();

        if let Some(data) = &identity.data {
            key.push_str("|data:");
            key.push_str(data.as_str());
        }

        if let Some(mime_type) = &event.mime_type {
            key.push_str("|type:");
            key.push_str(mime_type);
        }

        match &identity.stream {
            Some(stream) => {
                key.push_str("|stream:");
                key.push_str(&sha256_hex(stream));
            }
            None => {
                // BTreeSet iterates sorted, so insertion order never matters
                let names = identity
                    .extra_keys
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(",");
                key.push_str("|extras:");
                key.push_str(&sha256_hex(&names));
            }
        }

        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn sha256_hex(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{ActionKind, ContentReference};

    fn image_share(uri: &str) -> ShareEvent {
        ShareEvent::new(ActionKind::Send)
            .with_mime_type("image/png")
            .with_content_references([ContentReference::new(uri)])
    }

    #[test]
    fn test_identical_events_share_a_key() {
        let a = DedupKey::for_event(&image_share("content://media/1"));
        let b = DedupKey::for_event(&image_share("content://media/1"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_streams_differ() {
        let a = DedupKey::for_event(&image_share("content://media/1"));
        let b = DedupKey::for_event(&image_share("content://media/2"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_stream_key_layout() {
        let key = DedupKey::for_event(
            &image_share("content://media/1").with_data(ContentReference::new("content://x")),
        );
        let expected_hash = sha256_hex("content://media/1");

        assert_eq!(
            key.as_str(),
            format!(
                "android.intent.action.SEND|data:content://x|type:image/png|stream:{}",
                expected_hash
            )
        );
    }

    #[test]
    fn test_serialized_record_key() {
        let json = r#"{"action":"SEND","items":[],"exit":false}"#;
        let event = ShareEvent::new(ActionKind::Send)
            .with_mime_type("text/plain")
            .with_serialized_record(json);

        let key = DedupKey::for_event(&event);
        assert_eq!(
            key.to_string(),
            format!("android.intent.action.SEND|json:{}", sha256_hex(json))
        );
    }

    #[test]
    fn test_extras_fallback_ignores_insertion_order() {
        let a = ShareEvent::new(ActionKind::Send)
            .with_mime_type("text/plain")
            .with_subject("s")
            .with_text("one");
        let b = ShareEvent::new(ActionKind::Send)
            .with_mime_type("text/plain")
            .with_text("two")
            .with_subject("t");

        // Same key set, no stream: the accepted weak collision
        assert_eq!(DedupKey::for_event(&a), DedupKey::for_event(&b));
        assert!(DedupKey::for_event(&a).as_str().contains("|extras:"));
    }

    #[test]
    fn test_extra_key_sets_differ() {
        let a = ShareEvent::new(ActionKind::View).with_extra_key("a");
        let b = ShareEvent::new(ActionKind::View).with_extra_key("b");
        assert_ne!(DedupKey::for_event(&a), DedupKey::for_event(&b));
    }

    #[test]
    fn test_sha256_hex_length() {
        assert_eq!(sha256_hex("x").len(), 64);
    }
}
