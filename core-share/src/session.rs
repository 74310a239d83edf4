//! # Share Session
//!
//! The one piece of process-wide state: verbosity, logger and handler
//! registrations, the pending-record buffer and the seen dedup keys. All of
//! it sits behind a single lock, so ingestion, handler registration, reset
//! and enrichment completions are serialized against each other.
//!
//! ## Ingestion
//!
//! ```text
//! ShareEvent ─> DedupKey ─(seen?)─> discard
//!                  │
//!                  ▼
//!     serialized record? ─yes─> parse ─┐
//!                  │no                 │
//!                  ▼                   ▼
//!              normalize ─────> link record? ─yes─> spawn fetch ─> complete_enrichment ─┐
//!                                      │no                                             │
//!                                      ▼                                               ▼
//!                                DeliveryQueue::enqueue <──────────────────────────────┘
//! ```
//!
//! A reset bumps the session generation. Work started before the reset
//! still runs to completion, but its record is dropped instead of enqueued.
//!
//! ## Sending
//!
//! Records and forwarded log lines are queued in an [`Outbox`] while the lock
//! is held and sent after it is released, so a channel may call back into the
//! session. One caller at a time drains the outbox; a caller that finds a
//! drain in progress leaves its messages to it, which keeps them in FIFO
//! order.

use bridge_traits::{LogLevel, ScriptChannel, ShareEvent};
use core_runtime::config::BridgeConfig;
use core_runtime::events::{EventBus, PipelineEvent, Receiver};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::dedup::DedupKey;
use crate::enrichment::EnrichmentPipeline;
use crate::logger::GatedLogger;
use crate::model::Record;
use crate::normalizer::RecordNormalizer;
use crate::outbox::Outbox;
use crate::queue::{DeliveryQueue, Enqueued, HandlerState};
use crate::resolver::ResolverAdapter;

/// What happened to an ingested event.
#[derive(Debug)]
pub enum IngestOutcome {
    /// The event was seen before in this session.
    Duplicate,
    /// The event could not become a record, or a reset overtook it.
    Dropped,
    /// Buffered until a handler registers.
    Buffered { pending: usize },
    /// Delivered to the registered handler.
    Delivered,
    /// Page text is being fetched; the record is enqueued when the task ends.
    Enriching(JoinHandle<()>),
}

impl IngestOutcome {
    /// Wait for a pending enrichment, if any, to hand its record over.
    pub async fn join(self) {
        if let Self::Enriching(handle) = self {
            if let Err(e) = handle.await {
                warn!(error = %e, "Enrichment task failed");
            }
        }
    }
}

struct SessionState {
    logger: GatedLogger,
    queue: DeliveryQueue,
    seen_keys: HashSet<DedupKey>,
    generation: u64,
    outbox: Outbox,
    draining: bool,
}

impl SessionState {
    /// Move messages produced by the logger and the queue to the outbox.
    fn collect_outgoing(&mut self) {
        self.outbox.append(&mut self.logger.take_outgoing());
        self.outbox.append(&mut self.queue.take_outgoing());
    }
}

struct SessionInner {
    config: BridgeConfig,
    normalizer: RecordNormalizer,
    enrichment: EnrichmentPipeline,
    events: EventBus,
    state: Mutex<SessionState>,
}

/// Shared handle to the session. Clones refer to the same state.
#[derive(Clone)]
pub struct ShareSession {
    inner: Arc<SessionInner>,
}

impl ShareSession {
    pub fn new(config: BridgeConfig) -> Self {
        let state = SessionState {
            logger: GatedLogger::new(config.default_verbosity),
            queue: DeliveryQueue::new(),
            seen_keys: HashSet::new(),
            generation: 0,
            outbox: Outbox::new(),
            draining: false,
        };

        Self {
            inner: Arc::new(SessionInner {
                normalizer: RecordNormalizer::from_config(&config),
                enrichment: EnrichmentPipeline::from_config(&config),
                events: EventBus::new(config.event_buffer_size),
                state: Mutex::new(state),
                config,
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    pub fn subscribe(&self) -> Receiver<PipelineEvent> {
        self.inner.events.subscribe()
    }

    pub fn resolver(&self) -> &ResolverAdapter {
        self.inner.normalizer.adapter()
    }

    /// Ingest the event the platform currently holds, if there is one.
    pub async fn ingest_current(&self) -> Option<IngestOutcome> {
        let event = self.inner.config.event_source.as_ref()?.current_event()?;
        Some(self.ingest(event).await)
    }

    /// Run one share event through dedup, normalization and enrichment.
    pub async fn ingest(&self, event: ShareEvent) -> IngestOutcome {
        let key = DedupKey::for_event(&event);

        let claimed = self.with_state(|state| {
            state
                .logger
                .debug(&format!("ingest() {}", event.raw_identity.action));

            if state.seen_keys.contains(&key) {
                state
                    .logger
                    .debug(&format!("ingest() duplicate discarded: {}", key));
                return None;
            }

            state.seen_keys.insert(key.clone());
            Some(state.generation)
        });

        let Some(generation) = claimed else {
            self.emit(PipelineEvent::DuplicateDiscarded {
                dedup_key: key.into_string(),
            });
            return IngestOutcome::Duplicate;
        };

        let record = match &event.serialized_record {
            Some(json) => match Record::from_json(json) {
                Ok(record) => record,
                Err(e) => {
                    self.log(
                        LogLevel::Error,
                        &format!("Error converting share event to JSON: {}", e),
                    );
                    return IngestOutcome::Dropped;
                }
            },
            None => self.inner.normalizer.normalize(&event).await,
        };

        self.emit(PipelineEvent::Accepted {
            record_id: record.id,
            dedup_key: key.into_string(),
        });

        if let Some(url) = EnrichmentPipeline::target_url(&record) {
            self.emit(PipelineEvent::EnrichmentStarted {
                record_id: record.id,
                url,
            });

            let session = self.clone();
            let handle = tokio::spawn(async move {
                let (record, attached) = session.inner.enrichment.enrich(record).await;
                session.complete_enrichment(generation, record, attached);
            });
            return IngestOutcome::Enriching(handle);
        }

        self.with_state(|state| {
            if state.generation != generation {
                state.logger.debug(&format!(
                    "ingest() record {} overtaken by reset",
                    record.id
                ));
                return IngestOutcome::Dropped;
            }
            self.enqueue_locked(state, record)
        })
    }

    /// Register the record handler and flush the buffer into it.
    ///
    /// Returns the number of flushed records.
    pub fn register_handler(&self, channel: Arc<dyn ScriptChannel>) -> usize {
        self.with_state(|state| {
            let flushed = state.queue.register_handler(channel);
            self.emit(PipelineEvent::HandlerRegistered);

            for record in &flushed {
                self.emit(PipelineEvent::Delivered {
                    record_id: record.id,
                    action: record.action.clone(),
                    item_count: record.items.len(),
                });
            }

            let count = flushed.len();
            state
                .logger
                .debug(&format!("register_handler() flushed {} records", count));
            self.emit(PipelineEvent::Flushed { count });
            count
        })
    }

    pub fn register_logger(&self, channel: Arc<dyn ScriptChannel>) {
        self.with_state(|state| state.logger.set_channel(channel));
    }

    pub fn set_verbosity(&self, level: LogLevel) {
        self.with_state(|state| state.logger.set_verbosity(level));
    }

    pub fn verbosity(&self) -> LogLevel {
        self.with_state(|state| state.logger.verbosity())
    }

    /// Log through the gated logger.
    pub fn log(&self, level: LogLevel, message: &str) {
        self.with_state(|state| state.logger.log(level, message));
    }

    pub fn pending_count(&self) -> usize {
        self.with_state(|state| state.queue.pending_len())
    }

    pub fn handler_state(&self) -> HandlerState {
        self.with_state(|state| state.queue.state())
    }

    /// Clear all session state back to its defaults.
    ///
    /// The reset is logged before the logger channel is dropped, so a
    /// registered consumer logger sees it. Returns the number of buffered
    /// records that were discarded.
    pub fn reset(&self) -> usize {
        self.with_state(|state| {
            let discarded = state.queue.clear();
            state.seen_keys.clear();
            state.generation += 1;
            state.logger.info(&format!(
                "reset() discarded {} pending records",
                discarded
            ));
            state.logger.reset(self.inner.config.default_verbosity);
            self.emit(PipelineEvent::SessionReset { discarded });
            discarded
        })
    }

    fn complete_enrichment(&self, generation: u64, record: Record, attached: bool) {
        self.with_state(|state| {
            if state.generation != generation {
                state.logger.debug(&format!(
                    "Enrichment of record {} finished after reset, dropped",
                    record.id
                ));
                self.emit(PipelineEvent::EnrichmentDiscarded {
                    record_id: record.id,
                });
                return;
            }

            self.emit(PipelineEvent::EnrichmentFinished {
                record_id: record.id,
                content_attached: attached,
            });
            self.enqueue_locked(state, record);
        })
    }

    fn enqueue_locked(&self, state: &mut SessionState, record: Record) -> IngestOutcome {
        let record_id = record.id;
        let action = record.action.clone();
        let item_count = record.items.len();

        match state.queue.enqueue(record) {
            Enqueued::Buffered { pending } => {
                state.logger.debug(&format!(
                    "Record {} buffered, {} pending",
                    record_id, pending
                ));
                self.emit(PipelineEvent::Buffered { record_id, pending });
                IngestOutcome::Buffered { pending }
            }
            Enqueued::Delivered => {
                self.emit(PipelineEvent::Delivered {
                    record_id,
                    action,
                    item_count,
                });
                IngestOutcome::Delivered
            }
        }
    }

    fn emit(&self, event: PipelineEvent) {
        // No subscribers is the normal case
        self.inner.events.emit(event).ok();
    }

    /// Run `f` under the state lock, then send what it produced.
    fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let result = {
            let mut state = self.lock();
            let result = f(&mut *state);
            state.collect_outgoing();
            if state.draining {
                return result;
            }
            state.draining = true;
            result
        };

        self.drain();
        result
    }

    /// Send queued messages one at a time with the lock released.
    fn drain(&self) {
        loop {
            let next = {
                let mut state = self.lock();
                match state.outbox.pop() {
                    Some(outgoing) => outgoing,
                    None => {
                        state.draining = false;
                        return;
                    }
                }
            };
            next.send();
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ShareSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareSession")
            .field("config", &self.inner.config)
            .field("events", &self.inner.events)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{
        ActionKind, BridgeError, BridgeMessage, ContentReference, HttpTextFetcher,
        ReferenceResolver,
    };
    use bytes::Bytes;

    struct NoContent;

    #[async_trait]
    impl ReferenceResolver for NoContent {
        async fn open_bytes(&self, _reference: &ContentReference) -> BridgeResult<Bytes> {
            Err(BridgeError::NotAvailable("none".to_string()))
        }

        async fn display_name(&self, _reference: &ContentReference) -> BridgeResult<Option<String>> {
            Ok(None)
        }

        async fn mime_type(&self, _reference: &ContentReference) -> BridgeResult<Option<String>> {
            Ok(None)
        }
    }

    struct Offline;

    #[async_trait]
    impl HttpTextFetcher for Offline {
        async fn fetch_text(&self, _url: &str) -> BridgeResult<String> {
            Err(BridgeError::OperationFailed("offline".to_string()))
        }
    }

    struct Sink;

    impl ScriptChannel for Sink {
        fn send(&self, _message: BridgeMessage, _keep_open: bool) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn session() -> ShareSession {
        let config = BridgeConfig::builder()
            .resolver(Arc::new(NoContent))
            .http_fetcher(Arc::new(Offline))
            .build()
            .unwrap();
        ShareSession::new(config)
    }

    fn view(uri: &str) -> ShareEvent {
        ShareEvent::new(ActionKind::View).with_data(ContentReference::new(uri))
    }

    #[tokio::test]
    async fn test_duplicate_is_discarded() {
        let session = session();
        assert!(matches!(
            session.ingest(view("content://a")).await,
            IngestOutcome::Buffered { pending: 1 }
        ));
        assert!(matches!(
            session.ingest(view("content://a")).await,
            IngestOutcome::Duplicate
        ));
        assert_eq!(session.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_reset_forgets_seen_keys() {
        let session = session();
        session.ingest(view("content://a")).await;
        assert_eq!(session.reset(), 1);

        assert!(matches!(
            session.ingest(view("content://a")).await,
            IngestOutcome::Buffered { pending: 1 }
        ));
    }

    #[tokio::test]
    async fn test_malformed_serialized_record_is_dropped() {
        let session = session();
        let event = ShareEvent::new(ActionKind::Send).with_serialized_record("{not json");

        assert!(matches!(session.ingest(event).await, IngestOutcome::Dropped));
        assert_eq!(session.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_register_handler_flushes() {
        let session = session();
        session.ingest(view("content://a")).await;
        session.ingest(view("content://b")).await;

        assert_eq!(session.register_handler(Arc::new(Sink)), 2);
        assert_eq!(session.handler_state(), HandlerState::HandlerRegistered);
        assert!(matches!(
            session.ingest(view("content://c")).await,
            IngestOutcome::Delivered
        ));
    }

    #[tokio::test]
    async fn test_verbosity_restored_on_reset() {
        let session = session();
        session.set_verbosity(LogLevel::Error);
        session.reset();
        assert_eq!(session.verbosity(), LogLevel::Info);
    }

    #[tokio::test]
    async fn test_ingest_current_without_source() {
        assert!(session().ingest_current().await.is_none());
    }
}
