//! Error taxonomy for the collection stage.
//!
//! Faults split into three tiers: `CollectError` is fatal to a scan and
//! surfaces to the caller; `ExtractionFault` is local to one card and is
//! recovered by skipping it; everything downstream of collection uses
//! `anyhow` at the CLI boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal collection-stage errors.
#[derive(Debug, Error)]
pub enum CollectError {
    /// No card ever rendered within the initial wait window. Signals an
    /// empty or failed result set for the query.
    #[error("no posts appeared for query {query:?} within {waited_ms}ms")]
    EmptyFeed { query: String, waited_ms: u64 },

    /// The browser session failed before the first pass completed
    /// (navigation error, script execution error, lost connection).
    #[error("browser session fault: {0}")]
    Session(String),

    /// The cookie file used for login replay does not exist.
    #[error("cookie file not found: {0} (export your session cookies first)")]
    MissingCookies(PathBuf),
}

/// Per-card extraction failures. Never surfaced past the scanner: a faulted
/// card is skipped and the pass continues.
#[derive(Debug, Error)]
pub enum ExtractionFault {
    /// The card has no permalink, so it has no identity. Mandatory field.
    #[error("card has no permalink")]
    MissingPermalink,

    /// An element query failed mid-extraction.
    #[error("element query failed: {0}")]
    Element(String),
}
