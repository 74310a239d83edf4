//! # Record Normalizer
//!
//! Turns a raw [`ShareEvent`] into a [`Record`]:
//!
//! | action       | MIME type    | items                                   |
//! |--------------|--------------|-----------------------------------------|
//! | Send         | `text/plain` | one `public.url` item (+ preview image) |
//! | Send         | `image/*`    | the single stream reference             |
//! | SendMultiple | `image/*`    | each reference in order, up to the cap  |
//! | anything else|              | none                                    |
//!
//! A failure on one reference never affects its siblings.

use bridge_traits::{ActionKind, ShareEvent};
use core_runtime::config::BridgeConfig;
use tracing::debug;

use crate::model::{Item, Record, PREVIEW_IMAGE_TYPE};
use crate::resolver::ResolverAdapter;

const TEXT_PLAIN: &str = "text/plain";

/// Map a platform action onto the consumer's action name.
pub fn translate_action(kind: &ActionKind) -> String {
    match kind {
        ActionKind::Send | ActionKind::SendMultiple => "SEND".to_string(),
        ActionKind::View => "VIEW".to_string(),
        ActionKind::Other(raw) => raw.clone(),
    }
}

/// Pick the link out of shared text.
///
/// Browsers often share `"Page title https://…"`; the first whitespace
/// separated `http://` or `https://` token wins. Without one, the trimmed
/// text is returned unchanged.
pub fn detect_url(text: &str) -> String {
    text.split_whitespace()
        .find(|token| is_http_url(token))
        .unwrap_or_else(|| text.trim())
        .to_string()
}

/// Whether `value` is an absolute http(s) URL.
pub fn is_http_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    ["http://", "https://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme) && lower.len() > scheme.len())
}

/// Stateless share-event to record conversion.
#[derive(Clone)]
pub struct RecordNormalizer {
    adapter: ResolverAdapter,
    max_items: usize,
}

impl RecordNormalizer {
    pub fn new(adapter: ResolverAdapter, max_items: usize) -> Self {
        Self { adapter, max_items }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(ResolverAdapter::from_config(config), config.max_items)
    }

    pub fn adapter(&self) -> &ResolverAdapter {
        &self.adapter
    }

    pub async fn normalize(&self, event: &ShareEvent) -> Record {
        let mut record = Record::new(
            translate_action(&event.action_kind),
            event.exit_on_sent.unwrap_or(false),
        );
        record.text = event.free_text.clone();

        let mime_type = event.mime_type.as_deref();
        record.items = match (&event.action_kind, mime_type) {
            (ActionKind::Send, Some(TEXT_PLAIN)) => vec![self.url_item(event).await],
            (ActionKind::Send, Some(mime)) if mime.starts_with("image/") => {
                self.image_items(event, mime, 1).await
            }
            (ActionKind::SendMultiple, Some(mime)) if mime.starts_with("image/") => {
                self.image_items(event, mime, self.max_items).await
            }
            _ => Vec::new(),
        };

        debug!(
            action = %record.action,
            items = record.items.len(),
            "Normalized share event"
        );
        record
    }

    async fn url_item(&self, event: &ShareEvent) -> Item {
        let url = event.free_text.as_deref().map(detect_url);
        let mut item = Item::url(url, event.subject.clone());

        if let Some(preview) = &event.preview_reference {
            let scanned = self.adapter.scan_preview(preview).await;
            item.base64 = Some(scanned.base64);
            item.image_type = Some(PREVIEW_IMAGE_TYPE.to_string());
            item.set_barcodes(scanned.barcodes);
        }

        item
    }

    async fn image_items(&self, event: &ShareEvent, mime_type: &str, limit: usize) -> Vec<Item> {
        let limit = limit.min(self.max_items);
        let mut items = Vec::with_capacity(limit.min(event.content_references.len()));

        for reference in &event.content_references {
            if items.len() == limit {
                break;
            }

            match self.adapter.resolve(reference, mime_type).await {
                Ok(item) => items.push(item),
                Err(e) => debug!(reference = %reference, error = %e, "Skipping shared item"),
            }
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{BridgeError, ContentReference, ReferenceResolver};
    use bytes::Bytes;
    use mockall::mock;
    use std::sync::Arc;

    mock! {
        pub Resolver {}

        #[async_trait::async_trait]
        impl ReferenceResolver for Resolver {
            async fn open_bytes(&self, reference: &ContentReference) -> BridgeResult<Bytes>;
            async fn display_name(&self, reference: &ContentReference) -> BridgeResult<Option<String>>;
            async fn mime_type(&self, reference: &ContentReference) -> BridgeResult<Option<String>>;
        }
    }

    fn normalizer(resolver: MockResolver, max_items: usize) -> RecordNormalizer {
        RecordNormalizer::new(ResolverAdapter::new(Arc::new(resolver), None, 1024), max_items)
    }

    fn readable_resolver() -> MockResolver {
        let mut resolver = MockResolver::new();
        resolver
            .expect_open_bytes()
            .returning(|r| Ok(Bytes::from(r.as_str().to_string())));
        resolver.expect_display_name().returning(|_| Ok(None));
        resolver
    }

    fn refs(count: usize) -> Vec<ContentReference> {
        (0..count)
            .map(|i| ContentReference::new(format!("content://media/{}", i)))
            .collect()
    }

    #[test]
    fn test_translate_action() {
        assert_eq!(translate_action(&ActionKind::Send), "SEND");
        assert_eq!(translate_action(&ActionKind::SendMultiple), "SEND");
        assert_eq!(translate_action(&ActionKind::View), "VIEW");
        assert_eq!(
            translate_action(&ActionKind::Other("com.example.OPEN".to_string())),
            "com.example.OPEN"
        );
    }

    #[test]
    fn test_detect_url() {
        assert_eq!(detect_url("hello https://ex.com"), "https://ex.com");
        assert_eq!(detect_url("http://a.b/c  trailing"), "http://a.b/c");
        assert_eq!(detect_url("  no link here "), "no link here");
        assert_eq!(detect_url("https://"), "https://");
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://ex.com"));
        assert!(is_http_url("HTTP://EX.COM"));
        assert!(!is_http_url("ftp://ex.com"));
        assert!(!is_http_url("/sdcard/DCIM/cat.png"));
        assert!(!is_http_url("https://"));
    }

    #[tokio::test]
    async fn test_text_share_becomes_url_item() {
        let event = ShareEvent::new(ActionKind::Send)
            .with_mime_type("text/plain")
            .with_text("hello https://ex.com")
            .with_subject("Example");

        let record = normalizer(MockResolver::new(), 5).normalize(&event).await;

        assert_eq!(record.action, "SEND");
        assert!(!record.exit);
        assert_eq!(record.text.as_deref(), Some("hello https://ex.com"));
        let item = record.sole_item().unwrap();
        assert!(item.is_url());
        assert_eq!(item.url.as_deref(), Some("https://ex.com"));
        assert_eq!(item.title.as_deref(), Some("Example"));
        assert!(!item.processed);
        assert!(item.base64.is_none());
    }

    #[tokio::test]
    async fn test_preview_is_attached_to_url_item() {
        let event = ShareEvent::new(ActionKind::Send)
            .with_mime_type("text/plain")
            .with_text("https://ex.com")
            .with_preview(ContentReference::new("content://preview"))
            .with_exit_on_sent(true);

        let record = normalizer(readable_resolver(), 5).normalize(&event).await;

        assert!(record.exit);
        let item = record.sole_item().unwrap();
        assert_eq!(item.image_type.as_deref(), Some("image/jpeg"));
        assert!(!item.base64.as_deref().unwrap_or_default().is_empty());
        assert!(item.processed);
    }

    #[tokio::test]
    async fn test_single_image_share() {
        let event = ShareEvent::new(ActionKind::Send)
            .with_mime_type("image/png")
            .with_content_references(refs(3));

        let record = normalizer(readable_resolver(), 5).normalize(&event).await;
        assert_eq!(record.items.len(), 1);
        assert_eq!(record.items[0].uri.as_deref(), Some("content://media/0"));
    }

    #[tokio::test]
    async fn test_multiple_images_are_capped() {
        let event = ShareEvent::new(ActionKind::SendMultiple)
            .with_mime_type("image/jpeg")
            .with_content_references(refs(7));

        let record = normalizer(readable_resolver(), 5).normalize(&event).await;

        assert_eq!(record.items.len(), 5);
        let uris: Vec<_> = record.items.iter().filter_map(|i| i.uri.clone()).collect();
        assert_eq!(uris, refs(5).iter().map(|r| r.to_string()).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_unresolvable_reference_is_skipped() {
        let mut resolver = MockResolver::new();
        resolver.expect_open_bytes().returning(|r| {
            if r.as_str().ends_with("/1") {
                Err(BridgeError::NotAvailable("revoked".to_string()))
            } else {
                Ok(Bytes::from_static(b"ok"))
            }
        });
        resolver.expect_display_name().returning(|_| Ok(None));

        let event = ShareEvent::new(ActionKind::SendMultiple)
            .with_mime_type("image/jpeg")
            .with_content_references(refs(3));

        let record = normalizer(resolver, 5).normalize(&event).await;
        let uris: Vec<_> = record.items.iter().filter_map(|i| i.uri.as_deref()).collect();
        assert_eq!(uris, vec!["content://media/0", "content://media/2"]);
    }

    #[tokio::test]
    async fn test_unsupported_combinations_have_no_items() {
        let n = normalizer(MockResolver::new(), 5);

        let view = ShareEvent::new(ActionKind::View).with_mime_type("image/png");
        let pdf = ShareEvent::new(ActionKind::Send)
            .with_mime_type("application/pdf")
            .with_content_references(refs(1));
        let untyped = ShareEvent::new(ActionKind::SendMultiple).with_content_references(refs(2));

        for event in [view, pdf, untyped] {
            assert!(n.normalize(&event).await.items.is_empty());
        }
    }
}
