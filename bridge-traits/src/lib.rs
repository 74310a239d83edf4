//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the share-intent core and the
//! platform it runs on. Each trait represents a capability that the core
//! requires but that is implemented differently per platform (Android,
//! desktop, tests).
//!
//! ## Traits
//!
//! ### Event ingestion
//! - [`PlatformEventSource`](intent::PlatformEventSource) - Current share event held by the app
//! - [`ReferenceResolver`](storage::ReferenceResolver) - Bytes, path and MIME type behind a content reference
//!
//! ### Enrichment
//! - [`BarcodeDecoder`](barcode::BarcodeDecoder) - QR / data-matrix detection on shared images
//! - [`HttpTextFetcher`](http::HttpTextFetcher) - Page text of a shared link
//!
//! ### Scripting runtime boundary
//! - [`ScriptChannel`](channel::ScriptChannel) - Keep-open callback channel into the script layer
//! - [`HostActivity`](host::HostActivity) - Send the app to the background after a share
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Resolver, fetcher, decoder |
//! | Android  | host application    | 📋 Injected by the host |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. The
//! core never lets these errors cross into the scripting runtime: a failed
//! read degrades to an empty payload, a failed fetch to a missing `content`
//! field, an unavailable decoder to zero barcodes.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared through
//! `Arc` with the background tasks that perform reads and fetches.

pub mod barcode;
pub mod channel;
pub mod error;
pub mod host;
pub mod http;
pub mod intent;
pub mod log;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use barcode::BarcodeDecoder;
pub use channel::{BridgeMessage, MessagePayload, MessageStatus, ScriptChannel};
pub use host::HostActivity;
pub use http::HttpTextFetcher;
pub use intent::{ActionKind, ContentReference, PlatformEventSource, RawIdentity, ShareEvent};
pub use log::LogLevel;
pub use storage::ReferenceResolver;
