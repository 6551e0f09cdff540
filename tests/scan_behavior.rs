//! Scanner behavior against a scripted in-memory feed.
//!
//! The scripted session renders a fixed sequence of frames: each scroll
//! advances to the next frame, and the document height follows a scripted
//! series. This exercises the scroll/collect/dedupe/terminate loop without
//! a browser.

use anyhow::Result;
use async_trait::async_trait;
use memetrace::browser::{ElementHandle, FeedSession};
use memetrace::collector::{extract, Scanner};
use memetrace::config::ScanConfig;
use memetrace::error::CollectError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// One scripted feed card.
#[derive(Debug, Clone, Default)]
struct Card {
    permalink: Option<String>,
    text_spans: Vec<String>,
    author_spans: Vec<String>,
    datetime: Option<String>,
    engagement_label: Option<String>,
}

impl Card {
    fn post(id: u32) -> Self {
        Self {
            permalink: Some(format!("https://twitter.com/u{id}/status/{id}")),
            text_spans: vec![format!("post {id}")],
            author_spans: vec![format!("user{id}")],
            datetime: Some(format!("2024-11-{:02}T10:00:00.000Z", (id % 27) + 1)),
            engagement_label: Some(format!("1 reply, 2 reposts, {id} likes, 100 views")),
        }
    }
}

/// Scripted element: either a whole card or one of its sub-elements.
#[derive(Debug, Clone)]
enum Element {
    Card(Card),
    Text(String),
    Link(String),
    Time(String),
    Label(String),
}

#[async_trait]
impl ElementHandle for Element {
    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>> {
        let Element::Card(card) = self else {
            return Ok(Vec::new());
        };
        let spans = if selector.contains("tweetText") {
            &card.text_spans
        } else if selector.contains("User-Name") {
            &card.author_spans
        } else {
            return Ok(Vec::new());
        };
        Ok(spans
            .iter()
            .map(|s| Box::new(Element::Text(s.clone())) as Box<dyn ElementHandle>)
            .collect())
    }

    async fn find_one(&self, selector: &str) -> Result<Option<Box<dyn ElementHandle>>> {
        let Element::Card(card) = self else {
            return Ok(None);
        };
        let el = if selector.contains("/status/") {
            card.permalink.clone().map(Element::Link)
        } else if selector == "time" {
            card.datetime.clone().map(Element::Time)
        } else if selector.contains("likes") {
            card.engagement_label.clone().map(Element::Label)
        } else {
            None
        };
        Ok(el.map(|e| Box::new(e) as Box<dyn ElementHandle>))
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(match (self, name) {
            (Element::Link(href), "href") => Some(href.clone()),
            (Element::Time(dt), "datetime") => Some(dt.clone()),
            (Element::Label(label), "aria-label") => Some(label.clone()),
            _ => None,
        })
    }

    async fn text(&self) -> Result<String> {
        Ok(match self {
            Element::Text(t) => t.clone(),
            _ => String::new(),
        })
    }
}

/// A feed whose rendered cards and document height advance per scroll.
struct ScriptedFeed {
    frames: Vec<Vec<Card>>,
    heights: Vec<i64>,
    frame: AtomicUsize,
    script_calls: AtomicUsize,
    /// Script call index (0-based) at which the session starts failing.
    fail_after: AtomicUsize,
}

impl ScriptedFeed {
    fn new(frames: Vec<Vec<Card>>, heights: Vec<i64>) -> Self {
        Self {
            frames,
            heights,
            frame: AtomicUsize::new(0),
            script_calls: AtomicUsize::new(0),
            fail_after: AtomicUsize::new(usize::MAX),
        }
    }

    fn current(&self) -> usize {
        self.frame
            .load(Ordering::SeqCst)
            .min(self.frames.len().saturating_sub(1))
    }
}

#[async_trait]
impl FeedSession for ScriptedFeed {
    async fn navigate(&self, _url: &str) -> Result<()> {
        Ok(())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>> {
        assert!(selector.contains("article"), "unexpected selector {selector}");
        Ok(self.frames[self.current()]
            .iter()
            .map(|c| Box::new(Element::Card(c.clone())) as Box<dyn ElementHandle>)
            .collect())
    }

    async fn find_one(&self, _selector: &str) -> Result<Option<Box<dyn ElementHandle>>> {
        Ok(None)
    }

    async fn run_script(&self, js: &str) -> Result<serde_json::Value> {
        let n = self.script_calls.fetch_add(1, Ordering::SeqCst);
        if n >= self.fail_after.load(Ordering::SeqCst) {
            anyhow::bail!("session lost");
        }
        if js.contains("scrollTo") {
            self.frame.fetch_add(1, Ordering::SeqCst);
            return Ok(serde_json::Value::Null);
        }
        if js.contains("scrollHeight") {
            let i = self
                .frame
                .load(Ordering::SeqCst)
                .min(self.heights.len().saturating_sub(1));
            return Ok(serde_json::json!(self.heights[i]));
        }
        Ok(serde_json::Value::Null)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

fn fast_scanner() -> Scanner {
    Scanner::new(ScanConfig {
        initial_wait: Duration::from_millis(100),
        poll_interval: Duration::from_millis(10),
        settle_delay: Duration::from_millis(1),
    })
}

#[tokio::test]
async fn dedup_and_order_across_overlapping_frames() {
    // Frame 0 renders posts 1,2; frame 1 scrolls 1 out and 3 in; frame 2
    // renders nothing new.
    let feed = ScriptedFeed::new(
        vec![
            vec![Card::post(1), Card::post(2)],
            vec![Card::post(2), Card::post(3)],
            vec![Card::post(2), Card::post(3)],
        ],
        vec![100, 200, 300],
    );
    let outcome = fast_scanner().scan(&feed, "meme", None).await.unwrap();

    let urls: Vec<&str> = outcome.posts.iter().map(|p| p.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://twitter.com/u1/status/1",
            "https://twitter.com/u2/status/2",
            "https://twitter.com/u3/status/3",
        ]
    );
    let unique: std::collections::HashSet<_> = urls.iter().collect();
    assert_eq!(unique.len(), urls.len());
    assert!(outcome.fault.is_none());
}

#[tokio::test]
async fn output_order_is_first_sighting_not_timestamp() {
    // Post 20 is newer than post 5 but rendered later
    let mut newer = Card::post(20);
    newer.datetime = Some("2024-11-25T10:00:00.000Z".to_string());
    let mut older = Card::post(5);
    older.datetime = Some("2024-11-01T10:00:00.000Z".to_string());

    let feed = ScriptedFeed::new(
        vec![vec![older], vec![Card::post(5), newer.clone()], vec![newer]],
        vec![100, 200, 300],
    );
    let outcome = fast_scanner().scan(&feed, "meme", None).await.unwrap();
    assert_eq!(outcome.posts.len(), 2);
    assert!(outcome.posts[0].url.ends_with("/5"));
    assert!(outcome.posts[1].url.ends_with("/20"));
}

#[tokio::test]
async fn truncation_returns_exactly_first_n() {
    let feed = ScriptedFeed::new(
        vec![
            vec![Card::post(1), Card::post(2), Card::post(3)],
            vec![Card::post(4), Card::post(5)],
        ],
        vec![100, 200],
    );
    let outcome = fast_scanner().scan(&feed, "meme", Some(2)).await.unwrap();
    assert_eq!(outcome.posts.len(), 2);
    assert!(outcome.posts[0].url.ends_with("/1"));
    assert!(outcome.posts[1].url.ends_with("/2"));
    // Cutoff fires mid-pass, before any scroll
    assert_eq!(outcome.passes, 1);
}

#[tokio::test]
async fn three_cards_two_passes() {
    // One pass of three unique cards; the feed grows once, then renders
    // nothing new.
    let cards = vec![Card::post(1), Card::post(2), Card::post(3)];
    let feed = ScriptedFeed::new(
        vec![cards.clone(), cards],
        vec![100, 200, 200],
    );
    let outcome = fast_scanner().scan(&feed, "meme", None).await.unwrap();
    assert_eq!(outcome.posts.len(), 3);
    assert_eq!(outcome.passes, 2);
}

#[tokio::test]
async fn height_plateau_terminates_without_second_pass() {
    // Scrolling changes nothing at all: the height check is the fallback
    // strike and fires in the first pass.
    let cards = vec![Card::post(1)];
    let feed = ScriptedFeed::new(vec![cards.clone(), cards], vec![100, 100]);
    let outcome = fast_scanner().scan(&feed, "meme", None).await.unwrap();
    assert_eq!(outcome.posts.len(), 1);
    assert_eq!(outcome.passes, 1);
}

#[tokio::test]
async fn empty_feed_is_a_typed_error() {
    let feed = ScriptedFeed::new(vec![vec![]], vec![100]);
    let err = fast_scanner().scan(&feed, "meme", None).await.unwrap_err();
    assert!(matches!(err, CollectError::EmptyFeed { .. }));
}

#[tokio::test]
async fn cards_without_permalink_are_skipped() {
    let mut broken = Card::post(9);
    broken.permalink = None;
    let feed = ScriptedFeed::new(
        vec![vec![broken, Card::post(1)], vec![Card::post(1)]],
        vec![100, 200, 200],
    );
    let outcome = fast_scanner().scan(&feed, "meme", None).await.unwrap();
    assert_eq!(outcome.posts.len(), 1);
    assert!(outcome.posts[0].url.ends_with("/1"));
}

#[tokio::test]
async fn engagement_captured_at_first_sighting() {
    let mut first = Card::post(1);
    first.engagement_label = Some("1 reply, 1 repost, 7 likes, 10 views".to_string());
    let mut rerendered = Card::post(1);
    rerendered.engagement_label = Some("9 replies, 9 reposts, 999 likes, 9,000 views".to_string());

    let feed = ScriptedFeed::new(
        vec![vec![first], vec![rerendered, Card::post(2)], vec![Card::post(2)]],
        vec![100, 200, 300],
    );
    let outcome = fast_scanner().scan(&feed, "meme", None).await.unwrap();
    assert_eq!(outcome.posts[0].likes, "7");
}

#[tokio::test]
async fn session_fault_mid_scan_keeps_partial_results() {
    let feed = ScriptedFeed::new(
        vec![vec![Card::post(1), Card::post(2)], vec![Card::post(3)]],
        vec![100, 200, 300],
    );
    // Script calls run height, scroll, height, scroll, ... — call index 3
    // is the scroll ending the second pass.
    feed.fail_after.store(3, Ordering::SeqCst);

    let outcome = fast_scanner().scan(&feed, "meme", None).await.unwrap();
    assert!(outcome.fault.is_some());
    assert_eq!(outcome.posts.len(), 3);
    assert!(outcome.posts[2].url.ends_with("/3"));
}

#[tokio::test]
async fn extract_engagement_default_when_label_missing() {
    let mut card = Card::post(1);
    card.engagement_label = None;
    let post = extract::extract(&Element::Card(card)).await.unwrap();
    assert_eq!(post.likes, "0");
    assert_eq!(post.retweets, "0");
    assert_eq!(post.replies, "0");
    assert_eq!(post.views, "0");
}

#[tokio::test]
async fn extract_engagement_remap() {
    let mut card = Card::post(1);
    card.engagement_label = Some("3 replies, 7 reposts, 42 likes, 900 views".to_string());
    let post = extract::extract(&Element::Card(card)).await.unwrap();
    assert_eq!(post.likes, "42");
    assert_eq!(post.retweets, "7");
    assert_eq!(post.replies, "3");
    assert_eq!(post.views, "900");
}

#[tokio::test]
async fn extract_hashtags_from_text() {
    let mut card = Card::post(1);
    card.text_spans = vec!["check this".to_string(), "#fun meme #2024trend".to_string()];
    let post = extract::extract(&Element::Card(card)).await.unwrap();
    assert_eq!(post.text, "check this #fun meme #2024trend");
    assert_eq!(post.hashtags, "#fun,#2024trend");
}

#[tokio::test]
async fn extract_author_skips_handles() {
    let mut card = Card::post(1);
    card.author_spans = vec![
        "".to_string(),
        "@handle".to_string(),
        "Display Name".to_string(),
    ];
    let post = extract::extract(&Element::Card(card)).await.unwrap();
    assert_eq!(post.author, "Display Name");
}

#[tokio::test]
async fn extract_author_unknown_when_all_handles() {
    let mut card = Card::post(1);
    card.author_spans = vec!["@only".to_string()];
    let post = extract::extract(&Element::Card(card)).await.unwrap();
    assert_eq!(post.author, "unknown");
}

#[tokio::test]
async fn extract_timestamp_falls_back_to_wall_clock() {
    let mut card = Card::post(1);
    card.datetime = None;
    let post = extract::extract(&Element::Card(card)).await.unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(&post.created_at).is_ok());
}
