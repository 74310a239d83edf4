//! # Reference Resolver Adapter
//!
//! Wraps the platform [`ReferenceResolver`] and [`BarcodeDecoder`] so the
//! normalizer never sees a failure:
//!
//! - path and name lookups are best effort and leave fields absent on error
//! - a failed read yields an empty payload, never an error
//! - barcode decoding marks the item `processed` whatever the outcome
//!
//! Payloads larger than the configured threshold are encoded (and scanned)
//! on a blocking worker so a large photo does not stall the runtime.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bridge_traits::{BarcodeDecoder, BridgeError, ContentReference, ReferenceResolver};
use bytes::Bytes;
use core_runtime::config::BridgeConfig;
use core_runtime::logging::strip_path;
use std::sync::Arc;
use tokio::task;
use tracing::{debug, warn};

use crate::error::{Result, ShareError};
use crate::model::Item;

/// Per-item resolution on top of the platform bridges.
#[derive(Clone)]
pub struct ResolverAdapter {
    resolver: Arc<dyn ReferenceResolver>,
    decoder: Option<Arc<dyn BarcodeDecoder>>,
    large_payload_threshold: usize,
}

/// Base64 payload plus the barcodes found in the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedPayload {
    pub base64: String,
    pub barcodes: Vec<String>,
}

impl ResolverAdapter {
    pub fn new(
        resolver: Arc<dyn ReferenceResolver>,
        decoder: Option<Arc<dyn BarcodeDecoder>>,
        large_payload_threshold: usize,
    ) -> Self {
        Self {
            resolver,
            decoder,
            large_payload_threshold,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(
            Arc::clone(&config.resolver),
            config.barcode_decoder.clone(),
            config.large_payload_threshold,
        )
    }

    /// Resolve an image reference into a fully populated item.
    ///
    /// # Errors
    ///
    /// Returns an error only when nothing exists behind the reference
    /// (`BridgeError::NotAvailable`). A read failure of existing content
    /// still produces an item, with an empty `data` payload.
    pub async fn resolve(&self, reference: &ContentReference, mime_type: &str) -> Result<Item> {
        let mime_type = self.concrete_mime_type(reference, mime_type).await;
        let mut item = Item::image(mime_type, reference.as_str());
        self.populate_path_info(&mut item, reference).await;

        let bytes = match self.resolver.open_bytes(reference).await {
            Ok(bytes) => Some(bytes),
            Err(BridgeError::NotAvailable(reason)) => {
                debug!(reference = %reference, reason = %reason, "Reference not resolvable");
                return Err(ShareError::Unavailable(reason));
            }
            Err(e) => {
                warn!(reference = %reference, error = %e, "Failed to read shared content");
                None
            }
        };

        let scanned = match bytes {
            Some(bytes) => self.encode_and_scan(bytes).await,
            None => ScannedPayload::default(),
        };

        item.data = Some(scanned.base64);
        item.set_barcodes(scanned.barcodes);
        Ok(item)
    }

    /// Base64 of the content behind `reference`; empty on any failure.
    pub async fn payload_base64(&self, reference: &ContentReference) -> String {
        match self.read(reference).await {
            Some(bytes) => self.encode(bytes).await,
            None => String::new(),
        }
    }

    /// Base64 payload and barcodes of a preview image. Both are empty on
    /// read failure.
    pub async fn scan_preview(&self, reference: &ContentReference) -> ScannedPayload {
        match self.read(reference).await {
            Some(bytes) => self.encode_and_scan(bytes).await,
            None => ScannedPayload::default(),
        }
    }

    /// Every barcode value in the image behind `reference`, in detector
    /// order. Empty when nothing is found, the read fails, or no decoder is
    /// available.
    pub async fn decode_barcodes(&self, reference: &ContentReference) -> Vec<String> {
        match self.read(reference).await {
            Some(bytes) => self.encode_and_scan(bytes).await.barcodes,
            None => Vec::new(),
        }
    }

    /// Read the raw bytes for `load`, propagating the failure reason.
    pub async fn read_for_load(&self, reference: &ContentReference) -> Result<String> {
        let bytes = self.resolver.open_bytes(reference).await?;
        Ok(self.encode(bytes).await)
    }

    async fn read(&self, reference: &ContentReference) -> Option<Bytes> {
        match self.resolver.open_bytes(reference).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(reference = %reference, error = %e, "Failed to read shared content");
                None
            }
        }
    }

    // Wildcard share types ("image/*") are narrowed by asking the platform.
    async fn concrete_mime_type(&self, reference: &ContentReference, mime_type: &str) -> String {
        if !mime_type.ends_with("/*") {
            return mime_type.to_string();
        }

        match self.resolver.mime_type(reference).await {
            Ok(Some(concrete)) => concrete,
            Ok(None) => mime_type.to_string(),
            Err(e) => {
                debug!(reference = %reference, error = %e, "MIME lookup failed");
                mime_type.to_string()
            }
        }
    }

    async fn populate_path_info(&self, item: &mut Item, reference: &ContentReference) {
        match self.resolver.display_name(reference).await {
            Ok(Some(path)) => {
                item.name = Some(strip_path(&path).to_string());
                item.url = Some(path);
            }
            Ok(None) => {}
            Err(e) => debug!(reference = %reference, error = %e, "Path lookup failed"),
        }
    }

    async fn encode(&self, bytes: Bytes) -> String {
        if bytes.len() <= self.large_payload_threshold {
            return STANDARD.encode(&bytes);
        }

        debug!(size = bytes.len(), "Encoding large payload on blocking worker");
        match task::spawn_blocking(move || STANDARD.encode(&bytes)).await {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "Payload encoding task failed");
                String::new()
            }
        }
    }

    async fn encode_and_scan(&self, bytes: Bytes) -> ScannedPayload {
        let decoder = self.decoder.clone();

        if bytes.len() <= self.large_payload_threshold {
            return ScannedPayload {
                base64: STANDARD.encode(&bytes),
                barcodes: scan(decoder.as_deref(), &bytes),
            };
        }

        debug!(size = bytes.len(), "Scanning large payload on blocking worker");
        let job = task::spawn_blocking(move || ScannedPayload {
            base64: STANDARD.encode(&bytes),
            barcodes: scan(decoder.as_deref(), &bytes),
        });

        match job.await {
            Ok(scanned) => scanned,
            Err(e) => {
                warn!(error = %e, "Payload scanning task failed");
                ScannedPayload::default()
            }
        }
    }
}

fn scan(decoder: Option<&dyn BarcodeDecoder>, image: &[u8]) -> Vec<String> {
    let Some(decoder) = decoder else {
        debug!("Barcode decoder unavailable");
        return Vec::new();
    };

    if !decoder.is_operational() {
        debug!("Could not set up the barcode decoder");
        return Vec::new();
    }

    match decoder.decode(image) {
        Ok(values) => {
            debug!(count = values.len(), "Barcodes decoded");
            values
        }
        Err(e) => {
            warn!(error = %e, "Barcode decoding failed");
            Vec::new()
        }
    }
}
