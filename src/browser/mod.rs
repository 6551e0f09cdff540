//! Browser session abstraction for feed scraping.
//!
//! Defines the `FeedSession` and `ElementHandle` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide). The scanner
//! only ever talks to these traits, so tests can drive it with a scripted
//! in-memory feed.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;

/// An exclusively owned, navigable browser session pointed at the feed.
///
/// One session serves one scan at a time; the scanner assumes exclusive
/// access and blocks on every call.
#[async_trait]
pub trait FeedSession: Send + Sync {
    /// Navigate the session to a URL and wait for the load to finish.
    async fn navigate(&self, url: &str) -> Result<()>;
    /// All elements currently matching a CSS selector. Virtualized feeds
    /// only return what is rendered right now.
    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>>;
    /// First element matching a CSS selector, if any is rendered.
    async fn find_one(&self, selector: &str) -> Result<Option<Box<dyn ElementHandle>>>;
    /// Execute JavaScript in the page and return its value.
    async fn run_script(&self, js: &str) -> Result<serde_json::Value>;
    /// Close the session and release the browser.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A handle to one rendered element (a card or one of its sub-elements).
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Elements matching a selector within this element's subtree.
    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>>;
    /// First matching element within this element's subtree, if any.
    async fn find_one(&self, selector: &str) -> Result<Option<Box<dyn ElementHandle>>>;
    /// An attribute value, `None` if the attribute is absent.
    async fn attribute(&self, name: &str) -> Result<Option<String>>;
    /// The element's visible text, empty string if none.
    async fn text(&self) -> Result<String>;
}

/// Build the live-search URL for a query (recency-ordered results).
pub fn live_search_url(query: &str) -> String {
    let encoded: String =
        url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("https://twitter.com/search?q={encoded}&src=typed_query&f=live")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_search_url_encodes_query() {
        let url = live_search_url("chill guy");
        assert_eq!(
            url,
            "https://twitter.com/search?q=chill+guy&src=typed_query&f=live"
        );
    }

    #[test]
    fn test_live_search_url_special_chars() {
        let url = live_search_url("#meme2024");
        assert!(url.contains("%23meme2024"));
        assert!(url.ends_with("&f=live"));
    }
}
