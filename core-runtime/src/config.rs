//! # Bridge Configuration Module
//!
//! Provides configuration management for the share-intent core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `BridgeConfig` that holds every collaborator the pipeline talks to plus
//! its tuning knobs. It enforces fail-fast validation so a missing required
//! bridge is reported at startup instead of on the first share.
//!
//! ## Required Dependencies
//!
//! - `ReferenceResolver` - Reads shared content
//! - `HttpTextFetcher` - Fetches page text for shared links
//!
//! ## Optional Dependencies
//!
//! - `PlatformEventSource` - Event pulled on `init()` (none: nothing to pull)
//! - `BarcodeDecoder` - QR detection (none: decoder unavailable, zero codes)
//! - `HostActivity` - Used by `exit()` (none: `exit()` fails)
//!
//! When the `desktop-shims` feature is enabled, the `bridge-desktop`
//! resolver, fetcher and decoder are injected when not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::BridgeConfig;
//! use std::sync::Arc;
//!
//! let config = BridgeConfig::builder()
//!     .resolver(Arc::new(MyResolver))
//!     .http_fetcher(Arc::new(MyFetcher))
//!     .max_items(5)
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{
    BarcodeDecoder, HostActivity, HttpTextFetcher, LogLevel, PlatformEventSource,
    ReferenceResolver,
};
use std::sync::Arc;

/// Default maximum number of items carried by one record.
pub const DEFAULT_MAX_ITEMS: usize = 5;

/// Upper bound accepted for `max_items`.
pub const MAX_ITEMS_LIMIT: usize = 100;

/// Payloads above this size are base64-encoded on a blocking worker.
pub const DEFAULT_LARGE_PAYLOAD_THRESHOLD: usize = 1024 * 1024;

/// Configuration for the share-intent core.
///
/// Use [`BridgeConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct BridgeConfig {
    /// Source of the event held by the app at `init()` time
    pub event_source: Option<Arc<dyn PlatformEventSource>>,

    /// Content reference resolver (required)
    pub resolver: Arc<dyn ReferenceResolver>,

    /// Barcode detector for shared images
    pub barcode_decoder: Option<Arc<dyn BarcodeDecoder>>,

    /// Page text fetcher for shared links (required)
    pub http_fetcher: Arc<dyn HttpTextFetcher>,

    /// Host activity control for `exit()`
    pub host_activity: Option<Arc<dyn HostActivity>>,

    /// Maximum number of items per record
    pub max_items: usize,

    /// Verbosity applied at startup and restored on reset
    pub default_verbosity: LogLevel,

    /// Payload size (bytes) above which encoding moves to a blocking worker
    pub large_payload_threshold: usize,

    /// Capacity of the pipeline event bus
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field(
                "event_source",
                &self
                    .event_source
                    .as_ref()
                    .map(|_| "PlatformEventSource { ... }"),
            )
            .field("resolver", &"ReferenceResolver { ... }")
            .field(
                "barcode_decoder",
                &self
                    .barcode_decoder
                    .as_ref()
                    .map(|_| "BarcodeDecoder { ... }"),
            )
            .field("http_fetcher", &"HttpTextFetcher { ... }")
            .field(
                "host_activity",
                &self.host_activity.as_ref().map(|_| "HostActivity { ... }"),
            )
            .field("max_items", &self.max_items)
            .field("default_verbosity", &self.default_verbosity)
            .field("large_payload_threshold", &self.large_payload_threshold)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl BridgeConfig {
    /// Creates a new builder for constructing a `BridgeConfig`.
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - `max_items` is within `1..=MAX_ITEMS_LIMIT`
    /// - `large_payload_threshold` is not zero
    /// - `event_buffer_size` is not zero
    pub fn validate(&self) -> Result<()> {
        if self.max_items == 0 {
            return Err(Error::Config(
                "max_items must be greater than 0".to_string(),
            ));
        }

        if self.max_items > MAX_ITEMS_LIMIT {
            return Err(Error::Config(format!(
                "max_items exceeds maximum of {}",
                MAX_ITEMS_LIMIT
            )));
        }

        if self.large_payload_threshold == 0 {
            return Err(Error::Config(
                "large_payload_threshold must be greater than 0 bytes".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "event_buffer_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn resolver_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "ReferenceResolver".to_string(),
        message: "ReferenceResolver implementation is required to read shared content. \
                 Desktop: enable the 'desktop-shims' feature to use TokioFileResolver. \
                 Mobile: inject the platform content-provider adapter."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_fetcher_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpTextFetcher".to_string(),
        message: "HttpTextFetcher implementation is required to enrich shared links. \
                 Desktop: enable the 'desktop-shims' feature to use ReqwestTextFetcher. \
                 Mobile: inject a platform HTTP adapter."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_resolver() -> Result<Arc<dyn ReferenceResolver>> {
    use bridge_desktop::TokioFileResolver;

    let resolver: Arc<dyn ReferenceResolver> = Arc::new(TokioFileResolver::new());
    Ok(resolver)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_resolver() -> Result<Arc<dyn ReferenceResolver>> {
    Err(resolver_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_fetcher() -> Result<Arc<dyn HttpTextFetcher>> {
    use bridge_desktop::ReqwestTextFetcher;

    let fetcher = ReqwestTextFetcher::new().map_err(|e| {
        Error::Internal(format!("Failed to initialize default HttpTextFetcher: {}", e))
    })?;
    let fetcher: Arc<dyn HttpTextFetcher> = Arc::new(fetcher);
    Ok(fetcher)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_fetcher() -> Result<Arc<dyn HttpTextFetcher>> {
    Err(http_fetcher_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_barcode_decoder() -> Option<Arc<dyn BarcodeDecoder>> {
    use bridge_desktop::ImageBarcodeDecoder;

    Some(Arc::new(ImageBarcodeDecoder::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_barcode_decoder() -> Option<Arc<dyn BarcodeDecoder>> {
    None
}

/// Builder for constructing [`BridgeConfig`] instances.
#[derive(Default)]
pub struct BridgeConfigBuilder {
    event_source: Option<Arc<dyn PlatformEventSource>>,
    resolver: Option<Arc<dyn ReferenceResolver>>,
    barcode_decoder: Option<Arc<dyn BarcodeDecoder>>,
    http_fetcher: Option<Arc<dyn HttpTextFetcher>>,
    host_activity: Option<Arc<dyn HostActivity>>,
    max_items: Option<usize>,
    default_verbosity: Option<LogLevel>,
    large_payload_threshold: Option<usize>,
    event_buffer_size: Option<usize>,
}

impl BridgeConfigBuilder {
    /// Sets the platform event source pulled by `init()`.
    pub fn event_source(mut self, source: Arc<dyn PlatformEventSource>) -> Self {
        self.event_source = Some(source);
        self
    }

    /// Sets the content reference resolver.
    ///
    /// If not provided, the desktop default will be used when the
    /// `desktop-shims` feature is enabled.
    pub fn resolver(mut self, resolver: Arc<dyn ReferenceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the barcode decoder.
    pub fn barcode_decoder(mut self, decoder: Arc<dyn BarcodeDecoder>) -> Self {
        self.barcode_decoder = Some(decoder);
        self
    }

    /// Sets the page text fetcher.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_fetcher(mut self, fetcher: Arc<dyn HttpTextFetcher>) -> Self {
        self.http_fetcher = Some(fetcher);
        self
    }

    /// Sets the host activity used by `exit()`.
    pub fn host_activity(mut self, host: Arc<dyn HostActivity>) -> Self {
        self.host_activity = Some(host);
        self
    }

    /// Sets the maximum number of items per record.
    ///
    /// Default: 5
    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    /// Sets the verbosity applied at startup and after each reset.
    ///
    /// Default: `LogLevel::Info`
    pub fn default_verbosity(mut self, level: LogLevel) -> Self {
        self.default_verbosity = Some(level);
        self
    }

    /// Sets the payload size above which base64 encoding runs on a
    /// blocking worker.
    ///
    /// Default: 1 MiB
    pub fn large_payload_threshold(mut self, bytes: usize) -> Self {
        self.large_payload_threshold = Some(bytes);
        self
    }

    /// Sets the capacity of the pipeline event bus.
    ///
    /// Default: 100
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the configuration, filling platform defaults where allowed,
    /// and validates it.
    ///
    /// # Errors
    ///
    /// Returns `Error::CapabilityMissing` when a required bridge is absent
    /// and no default exists, or `Error::Config` when validation fails.
    pub fn build(self) -> Result<BridgeConfig> {
        let resolver = match self.resolver {
            Some(resolver) => resolver,
            None => provide_default_resolver()?,
        };

        let http_fetcher = match self.http_fetcher {
            Some(fetcher) => fetcher,
            None => provide_default_http_fetcher()?,
        };

        let barcode_decoder = self
            .barcode_decoder
            .or_else(provide_default_barcode_decoder);

        let config = BridgeConfig {
            event_source: self.event_source,
            resolver,
            barcode_decoder,
            http_fetcher,
            host_activity: self.host_activity,
            max_items: self.max_items.unwrap_or(DEFAULT_MAX_ITEMS),
            default_verbosity: self.default_verbosity.unwrap_or_default(),
            large_payload_threshold: self
                .large_payload_threshold
                .unwrap_or(DEFAULT_LARGE_PAYLOAD_THRESHOLD),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;
        Ok(config)
    }
}
