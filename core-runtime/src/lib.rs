//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the share-intent core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Pipeline event bus
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the core depends on. It
//! establishes the logging conventions, the bridge wiring and validation
//! rules, and the broadcast channel through which the ingestion pipeline
//! reports what happened to each share event.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
