//! HTTP Text Fetch Abstraction
//!
//! Fetches the body of a shared link as text so it can be attached to the
//! record before delivery.

use async_trait::async_trait;

use crate::error::Result;

/// Async page-text fetcher trait
///
/// Implementations decode the body as UTF-8, replacing invalid sequences
/// with U+FFFD, and return it with its lines
/// joined by `"\n"` (see [`join_lines`]). No timeout is imposed by the core;
/// a stalled fetch only stalls the record that requested it.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::HttpTextFetcher;
///
/// async fn title_line(fetcher: &dyn HttpTextFetcher) -> Option<String> {
///     let text = fetcher.fetch_text("https://example.com").await.ok()?;
///     text.lines().find(|l| l.contains("<title>")).map(str::to_string)
/// }
/// ```
#[async_trait]
pub trait HttpTextFetcher: Send + Sync {
    /// Fetch `url` and return its body text.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The URL is malformed
    /// - Network connection fails
    /// - The server answers with a non-success status
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Decode a response body as UTF-8 and re-join its lines with `"\n"`.
///
/// Invalid byte sequences become U+FFFD, so a mis-declared or Latin-1 page
/// still yields its text. `\r\n` line endings are normalised and the
/// trailing newline dropped, the way a line-by-line reader would see the body.
pub fn join_lines(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .lines()
        .collect::<Vec<_>>()
        .join("\n")
}
