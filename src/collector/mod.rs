//! The scroll-and-collect loop against a live, virtualized feed.
//!
//! The scanner repeatedly enumerates the currently rendered cards, extracts
//! and deduplicates them by permalink, and scrolls for more. It terminates
//! on a two-strike signal: a pass that yields no never-before-seen card ends
//! the scan outright, and a scroll that fails to grow the document's
//! scrollable extent ends it as the final fallback.

pub mod extract;

use crate::browser::FeedSession;
use crate::config::ScanConfig;
use crate::error::CollectError;
use crate::model::Post;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Scroll the rendered document to its bottom so the feed lazily loads more.
const SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// The document's current scrollable extent.
const HEIGHT_SCRIPT: &str = "document.body.scrollHeight";

/// What a scan produced.
///
/// A session fault after the initial wait does not discard what was already
/// gathered: `posts` holds everything collected up to the fault and `fault`
/// carries the failure. Callers that need all-or-nothing semantics can treat
/// `fault.is_some()` as a failure themselves.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Collected records in first-sighting order, permalink-unique.
    pub posts: Vec<Post>,
    /// Session fault that cut the scan short, if any.
    pub fault: Option<String>,
    /// Number of enumeration passes performed.
    pub passes: u32,
}

/// Drives one scan of the feed for one query.
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Collect posts from the feed the session is already pointed at.
    ///
    /// Preconditions: `session` is authenticated and navigated to the
    /// live-results view for `query`. The query string is only used for
    /// logging and error messages here.
    ///
    /// Terminates when `max_items` is reached, when a pass renders no new
    /// card, when scrolling stops growing the document, or when the session
    /// faults. An initial wait bounded by `ScanConfig::initial_wait` guards
    /// the first card; if none appears the scan fails with
    /// [`CollectError::EmptyFeed`] and zero records.
    pub async fn scan(
        &self,
        session: &dyn FeedSession,
        query: &str,
        max_items: Option<usize>,
    ) -> Result<ScanOutcome, CollectError> {
        self.wait_for_first_card(session, query).await?;

        // Scan state is local to this call: one scanner can serve
        // back-to-back scans without carrying anything over.
        let mut seen: HashSet<String> = HashSet::new();
        let mut posts: Vec<Post> = Vec::new();
        let mut passes = 0u32;
        let mut fault: Option<String> = None;

        let mut last_height = match measure_height(session).await {
            Ok(h) => h,
            Err(e) => {
                return Ok(ScanOutcome {
                    posts,
                    fault: Some(e),
                    passes,
                })
            }
        };

        'scan: loop {
            passes += 1;
            let cards = match session.find_all(extract::CARD_SELECTOR).await {
                Ok(c) => c,
                Err(e) => {
                    fault = Some(e.to_string());
                    break;
                }
            };
            debug!("pass {passes}: {} cards rendered", cards.len());

            let mut new_count = 0usize;
            for card in &cards {
                let post = match extract::extract(card.as_ref()).await {
                    Ok(p) => p,
                    Err(f) => {
                        debug!("skipping card: {f}");
                        continue;
                    }
                };
                // Permalink identity: re-rendered cards are dropped here, so
                // engagement counts stay as captured at first sighting.
                if !seen.insert(post.url.clone()) {
                    continue;
                }
                debug!(
                    "collected {}: likes={} retweets={} replies={} views={}",
                    post.author, post.likes, post.retweets, post.replies, post.views
                );
                posts.push(post);
                new_count += 1;

                if let Some(max) = max_items {
                    if posts.len() >= max {
                        info!("reached max of {max} posts, stopping");
                        posts.truncate(max);
                        break 'scan;
                    }
                }
            }
            debug!("pass {passes}: {new_count} new posts");

            if new_count == 0 {
                info!("no new posts rendered, feed exhausted after {passes} passes");
                break;
            }

            if let Err(e) = session.run_script(SCROLL_SCRIPT).await {
                fault = Some(e.to_string());
                break;
            }
            tokio::time::sleep(self.config.settle_delay).await;

            let new_height = match measure_height(session).await {
                Ok(h) => h,
                Err(e) => {
                    fault = Some(e);
                    break;
                }
            };
            if new_height == last_height {
                info!("document height unchanged at {new_height}, nothing left to load");
                break;
            }
            last_height = new_height;
        }

        if let Some(ref f) = fault {
            warn!("scan of {query:?} cut short by session fault: {f}");
        }
        info!("collected {} posts for {query:?}", posts.len());

        Ok(ScanOutcome {
            posts,
            fault,
            passes,
        })
    }

    /// Poll until at least one card renders, bounded by the configured wait.
    async fn wait_for_first_card(
        &self,
        session: &dyn FeedSession,
        query: &str,
    ) -> Result<(), CollectError> {
        let deadline = Instant::now() + self.config.initial_wait;
        loop {
            match session.find_all(extract::CARD_SELECTOR).await {
                Ok(cards) if !cards.is_empty() => return Ok(()),
                Ok(_) => {}
                Err(e) => return Err(CollectError::Session(e.to_string())),
            }
            if Instant::now() >= deadline {
                return Err(CollectError::EmptyFeed {
                    query: query.to_string(),
                    waited_ms: self.config.initial_wait.as_millis() as u64,
                });
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

async fn measure_height(session: &dyn FeedSession) -> Result<i64, String> {
    let value = session
        .run_script(HEIGHT_SCRIPT)
        .await
        .map_err(|e| e.to_string())?;
    Ok(value.as_i64().unwrap_or_default())
}
