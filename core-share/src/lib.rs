//! # Share Intent Core
//!
//! Turns OS-level share events into a deduplicated, delivery-guaranteed
//! stream of records for an application's scripting layer.
//!
//! ## Overview
//!
//! The platform and the scripting runtime start independently: a share can
//! arrive before the consumer registered its handler, and the platform may
//! hand over the same share twice. This crate decides what an event becomes,
//! when it is safe to deliver, and makes sure it is delivered once.
//!
//! ## Components
//!
//! - **Record Normalizer** (`normalizer`): share event to canonical record
//! - **Reference Resolver Adapter** (`resolver`): item metadata, base64 payload, barcodes
//! - **Enrichment Pipeline** (`enrichment`): page text for shared links
//! - **Dedup Key Generator** (`dedup`): stable identity of a raw event
//! - **Delivery Queue** (`queue`): buffer until a handler registers, then route directly
//! - **Verbosity-Gated Logger** (`logger`): local sink plus forwarding to the consumer
//! - **Outbox** (`outbox`): messages held until the session lock is released
//! - **Share Session** (`session`): the process-wide state tying them together
//! - **Command Dispatch** (`commands`): `setVerbosity`, `init`, `setHandler`, `setLogger`, `load`, `exit`
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::BridgeConfig;
//! use core_share::{CommandDispatcher, ShareSession};
//! use std::sync::Arc;
//!
//! let config = BridgeConfig::builder()
//!     .event_source(Arc::new(my_intent_source))
//!     .build()?;
//! let dispatcher = CommandDispatcher::new(ShareSession::new(config));
//!
//! // Calls from the scripting runtime
//! dispatcher.execute("setHandler", &[], handler_channel).await;
//! dispatcher.execute("init", &[], init_channel).await;
//! ```

pub mod commands;
pub mod dedup;
pub mod enrichment;
pub mod error;
pub mod logger;
pub mod model;
pub mod normalizer;
pub mod outbox;
pub mod queue;
pub mod resolver;
pub mod session;

pub use commands::{Command, CommandAck, CommandDispatcher};
pub use dedup::DedupKey;
pub use enrichment::EnrichmentPipeline;
pub use error::{Result, ShareError};
pub use logger::GatedLogger;
pub use model::{Item, Record};
pub use normalizer::RecordNormalizer;
pub use outbox::{Outbox, Outgoing};
pub use queue::{DeliveryQueue, Enqueued, HandlerState};
pub use resolver::{ResolverAdapter, ScannedPayload};
pub use session::{IngestOutcome, ShareSession};
