//! # Enrichment Pipeline
//!
//! Link records get the text of the linked page attached as `content`
//! before they are delivered. Image records need nothing here: barcodes were
//! decoded while normalizing.
//!
//! A fetch failure is not an error for the record; it is delivered without
//! `content`.

use bridge_traits::HttpTextFetcher;
use core_runtime::config::BridgeConfig;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::model::Record;
use crate::normalizer::is_http_url;

#[derive(Clone)]
pub struct EnrichmentPipeline {
    fetcher: Arc<dyn HttpTextFetcher>,
}

impl EnrichmentPipeline {
    pub fn new(fetcher: Arc<dyn HttpTextFetcher>) -> Self {
        Self { fetcher }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(Arc::clone(&config.http_fetcher))
    }

    /// The URL to fetch for `record`, if it needs enrichment at all.
    ///
    /// Only a record whose sole item carries a fetchable http(s) URL
    /// qualifies.
    pub fn target_url(record: &Record) -> Option<String> {
        record
            .sole_item()
            .and_then(|item| item.url.as_deref())
            .filter(|url| is_http_url(url))
            .map(str::to_string)
    }

    /// Fetch the page text and attach it to the sole item.
    ///
    /// Returns the record and whether content was attached.
    pub async fn enrich(&self, mut record: Record) -> (Record, bool) {
        let Some(url) = Self::target_url(&record) else {
            return (record, false);
        };

        let content = match self.fetcher.fetch_text(&url).await {
            Ok(text) => {
                debug!(record_id = %record.id, chars = text.len(), "Page text fetched");
                Some(text)
            }
            Err(e) => {
                warn!(record_id = %record.id, url = %url, error = %e, "Page text fetch failed");
                None
            }
        };

        let attached = content.is_some();
        if let (Some(item), Some(content)) = (record.sole_item_mut(), content) {
            item.content = Some(content);
        }

        (record, attached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::BridgeError;
    use mockall::mock;

    mock! {
        pub Fetcher {}

        #[async_trait::async_trait]
        impl HttpTextFetcher for Fetcher {
            async fn fetch_text(&self, url: &str) -> BridgeResult<String>;
        }
    }

    fn url_record(url: &str) -> Record {
        let mut record = Record::new("SEND", false);
        record.items.push(Item::url(Some(url.to_string()), None));
        record
    }

    #[test]
    fn test_target_url() {
        assert_eq!(
            EnrichmentPipeline::target_url(&url_record("https://ex.com")).as_deref(),
            Some("https://ex.com")
        );
        assert!(EnrichmentPipeline::target_url(&url_record("just text")).is_none());

        let mut two = url_record("https://ex.com");
        two.items.push(Item::default());
        assert!(EnrichmentPipeline::target_url(&two).is_none());

        let mut image = Record::new("SEND", false);
        let mut item = Item::image("image/png", "content://media/1");
        item.url = Some("/sdcard/DCIM/cat.png".to_string());
        image.items.push(item);
        assert!(EnrichmentPipeline::target_url(&image).is_none());
    }

    #[tokio::test]
    async fn test_enrich_attaches_content() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch_text()
            .withf(|url| url == "https://ex.com")
            .times(1)
            .returning(|_| Ok("<html>\n</html>".to_string()));

        let pipeline = EnrichmentPipeline::new(Arc::new(fetcher));
        let (record, attached) = pipeline.enrich(url_record("https://ex.com")).await;

        assert!(attached);
        assert_eq!(
            record.sole_item().unwrap().content.as_deref(),
            Some("<html>\n</html>")
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_content_absent() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch_text()
            .returning(|_| Err(BridgeError::OperationFailed("HTTP error: 404".to_string())));

        let pipeline = EnrichmentPipeline::new(Arc::new(fetcher));
        let (record, attached) = pipeline.enrich(url_record("https://ex.com/missing")).await;

        assert!(!attached);
        assert!(record.sole_item().unwrap().content.is_none());
    }

    #[tokio::test]
    async fn test_non_link_record_is_untouched() {
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch_text().never();

        let pipeline = EnrichmentPipeline::new(Arc::new(fetcher));
        let original = Record::new("VIEW", false);
        let (record, attached) = pipeline.enrich(original.clone()).await;

        assert!(!attached);
        assert_eq!(record, original);
    }
}
