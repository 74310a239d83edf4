//! Content Storage Abstraction
//!
//! Turns opaque [`ContentReference`]s into bytes and metadata owned by the
//! platform storage layer (Android content providers, desktop filesystem).

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::intent::ContentReference;

/// Content reference resolver trait
///
/// Implementations should treat every call as independent; the core calls
/// them for each item of a multi-item share and tolerates individual
/// failures.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::ReferenceResolver;
///
/// async fn payload_len(resolver: &dyn ReferenceResolver, reference: &ContentReference) -> usize {
///     resolver.open_bytes(reference).await.map(|b| b.len()).unwrap_or(0)
/// }
/// ```
#[async_trait]
pub trait ReferenceResolver: Send + Sync {
    /// Read the entire content behind the reference.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::NotAvailable` when nothing exists behind the
    /// reference (the item is dropped from multi-item shares), and any other
    /// error when the content exists but cannot be read (the item is kept
    /// with an empty payload).
    async fn open_bytes(&self, reference: &ContentReference) -> Result<Bytes>;

    /// Best-effort display path of the content (full path or display name).
    ///
    /// `Ok(None)` means the platform has no path for this reference.
    async fn display_name(&self, reference: &ContentReference) -> Result<Option<String>>;

    /// MIME type reported by the platform for this reference.
    async fn mime_type(&self, reference: &ContentReference) -> Result<Option<String>>;
}
