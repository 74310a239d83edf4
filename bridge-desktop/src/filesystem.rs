//! Content Reference Resolver Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    intent::ContentReference,
    storage::ReferenceResolver,
};
use bytes::Bytes;
use image::ImageFormat;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Tokio-based resolver for `file://` URIs and plain paths
///
/// Relative references are resolved against an optional base directory
/// (for example the directory a desktop "share" drop target writes into).
pub struct TokioFileResolver {
    base_dir: Option<PathBuf>,
}

impl TokioFileResolver {
    /// Create a resolver that accepts absolute paths only
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    /// Create a resolver that resolves relative references under `base_dir`
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self {
            base_dir: Some(base_dir),
        }
    }

    fn path_of(&self, reference: &ContentReference) -> Result<PathBuf> {
        let raw = reference.as_str();
        let raw = raw.strip_prefix("file://").unwrap_or(raw);

        if raw.is_empty() || raw.contains("://") {
            return Err(BridgeError::NotAvailable(format!(
                "Unsupported content reference: {}",
                reference
            )));
        }

        let path = Path::new(raw);
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }

        match &self.base_dir {
            Some(base) => Ok(base.join(path)),
            None => Err(BridgeError::NotAvailable(format!(
                "Relative reference without base directory: {}",
                reference
            ))),
        }
    }
}

impl Default for TokioFileResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReferenceResolver for TokioFileResolver {
    async fn open_bytes(&self, reference: &ContentReference) -> Result<Bytes> {
        let path = self.path_of(reference)?;
        let data = fs::read(&path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                BridgeError::NotAvailable(format!("No content at {}", reference))
            }
            _ => BridgeError::Io(e),
        })?;
        debug!(path = ?path, size = data.len(), "Read shared content");
        Ok(Bytes::from(data))
    }

    async fn display_name(&self, reference: &ContentReference) -> Result<Option<String>> {
        let path = self.path_of(reference)?;
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        Ok(path.to_str().map(str::to_string))
    }

    async fn mime_type(&self, reference: &ContentReference) -> Result<Option<String>> {
        let path = self.path_of(reference)?;
        Ok(ImageFormat::from_path(&path)
            .ok()
            .map(|format| format.to_mime_type().to_string()))
    }
}
