//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides implementations of the collaborator traits the
//! share-intent core needs, using desktop-appropriate libraries:
//! - `ReferenceResolver` using `tokio::fs` over `file://` URIs and plain paths
//! - `HttpTextFetcher` using `reqwest`
//! - `BarcodeDecoder` using `image` for decoding and `rqrr` for QR detection
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ImageBarcodeDecoder, ReqwestTextFetcher, TokioFileResolver};
//! use std::sync::Arc;
//!
//! let config = BridgeConfig::builder()
//!     .resolver(Arc::new(TokioFileResolver::new()))
//!     .http_fetcher(Arc::new(ReqwestTextFetcher::new()?))
//!     .barcode_decoder(Arc::new(ImageBarcodeDecoder::new()))
//!     .build()?;
//! ```

mod barcode;
mod filesystem;
mod http;

pub use barcode::ImageBarcodeDecoder;
pub use filesystem::TokioFileResolver;
pub use http::ReqwestTextFetcher;
