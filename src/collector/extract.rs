//! Card extraction: one rendered feed item -> one `Post`.
//!
//! Five sub-fields resolve independently. Only the permalink is mandatory;
//! every other field degrades to a documented default, so a half-rendered
//! card still yields a usable record.

use crate::browser::ElementHandle;
use crate::error::ExtractionFault;
use crate::model::Post;
use chrono::Utc;
use regex::Regex;
use std::sync::OnceLock;

/// One rendered post card in the virtualized feed list.
pub const CARD_SELECTOR: &str = r#"article[data-testid="tweet"]"#;

/// Canonical per-item URL, the deduplication identity.
const PERMALINK_SELECTOR: &str = r#"a[href*="/status/"]"#;

/// Text fragments of the post body.
const TEXT_SELECTOR: &str = r#"div[data-testid="tweetText"] span"#;

/// Display-name candidates. Handles (`@name`) are filtered out below.
const AUTHOR_SELECTOR: &str = r#"div[data-testid="User-Name"] span"#;

/// Accessibility label bundling reply/repost/like/view counts.
const ENGAGEMENT_SELECTOR: &str = r#"div[aria-label*="likes"]"#;

/// Extract a structured record from one rendered card.
///
/// Fails only when the permalink cannot be resolved; the scanner skips such
/// cards without aborting the pass.
pub async fn extract(card: &dyn ElementHandle) -> Result<Post, ExtractionFault> {
    let url = resolve_permalink(card).await?;
    let text = resolve_text(card).await;
    let author = resolve_author(card).await;
    let created_at = resolve_timestamp(card).await;
    let engagement = resolve_engagement(card).await;
    let hashtags = extract_hashtags(&text);

    Ok(Post {
        author,
        text,
        hashtags,
        likes: engagement.likes,
        retweets: engagement.retweets,
        replies: engagement.replies,
        views: engagement.views,
        created_at,
        url,
    })
}

async fn resolve_permalink(card: &dyn ElementHandle) -> Result<String, ExtractionFault> {
    let link = card
        .find_one(PERMALINK_SELECTOR)
        .await
        .map_err(|e| ExtractionFault::Element(e.to_string()))?
        .ok_or(ExtractionFault::MissingPermalink)?;
    let href = link
        .attribute("href")
        .await
        .map_err(|e| ExtractionFault::Element(e.to_string()))?
        .unwrap_or_default();
    if href.is_empty() {
        return Err(ExtractionFault::MissingPermalink);
    }
    Ok(href)
}

/// All text fragments, whitespace-joined. Empty string if the card has no
/// text body (image-only posts).
async fn resolve_text(card: &dyn ElementHandle) -> String {
    let spans = card.find_all(TEXT_SELECTOR).await.unwrap_or_default();
    let mut parts = Vec::new();
    for span in spans {
        if let Ok(t) = span.text().await {
            let t = t.trim().to_string();
            if !t.is_empty() {
                parts.push(t);
            }
        }
    }
    parts.join(" ")
}

/// First non-empty name candidate that is not a handle (no `@`).
async fn resolve_author(card: &dyn ElementHandle) -> String {
    let spans = card.find_all(AUTHOR_SELECTOR).await.unwrap_or_default();
    for span in spans {
        if let Ok(t) = span.text().await {
            let t = t.trim();
            if !t.is_empty() && !t.contains('@') {
                return t.to_string();
            }
        }
    }
    "unknown".to_string()
}

/// Machine-readable timestamp, or the collection wall clock when the card
/// carries none. The fallback is an approximation, not a fault.
async fn resolve_timestamp(card: &dyn ElementHandle) -> String {
    if let Ok(Some(time)) = card.find_one("time").await {
        if let Ok(Some(dt)) = time.attribute("datetime").await {
            if !dt.is_empty() {
                return dt;
            }
        }
    }
    Utc::now().to_rfc3339()
}

async fn resolve_engagement(card: &dyn ElementHandle) -> EngagementCounts {
    let label = match card.find_one(ENGAGEMENT_SELECTOR).await {
        Ok(Some(el)) => el.attribute("aria-label").await.ok().flatten(),
        _ => None,
    };
    match label {
        Some(l) => parse_engagement_label(&l),
        None => EngagementCounts::default(),
    }
}

/// Parsed engagement counts in the record's canonical field order.
#[derive(Debug, Clone, PartialEq)]
pub struct EngagementCounts {
    pub likes: String,
    pub retweets: String,
    pub replies: String,
    pub views: String,
}

impl Default for EngagementCounts {
    /// Engagement is non-essential metadata: an absent or unparsable label
    /// degrades silently to all-zero counts.
    fn default() -> Self {
        Self {
            likes: "0".to_string(),
            retweets: "0".to_string(),
            replies: "0".to_string(),
            views: "0".to_string(),
        }
    }
}

fn engagement_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Label order is (replies, reposts, likes, views); storage order is
        // (likes, retweets, replies, views). Pluralization is optional and
        // counts may carry thousands separators.
        Regex::new(
            r"(\d+(?:,\d+)*) repl(?:y|ies), (\d+(?:,\d+)*) reposts?, (\d+(?:,\d+)*) likes?,?.*?(\d+(?:,\d+)*) views?",
        )
        .expect("engagement pattern is valid")
    })
}

/// Parse the aggregate engagement label, remapping the label's field order
/// into the record's. Thousands separators are stripped so downstream
/// numeric coercion never sees locale formatting.
pub fn parse_engagement_label(label: &str) -> EngagementCounts {
    match engagement_re().captures(label) {
        Some(caps) => {
            let num = |i: usize| caps[i].replace(',', "");
            EngagementCounts {
                likes: num(3),
                retweets: num(2),
                replies: num(1),
                views: num(4),
            }
        }
        None => EngagementCounts::default(),
    }
}

fn hashtag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\w+").expect("hashtag pattern is valid"))
}

/// Derive hashtags from the resolved text, comma-joined.
pub fn extract_hashtags(text: &str) -> String {
    hashtag_re()
        .find_iter(text)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
