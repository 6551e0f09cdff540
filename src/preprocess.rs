//! Cleaning and enrichment of raw captures.
//!
//! Turns string-typed raw records into typed rows: parsed timestamps with
//! derived date/hour/weekday columns, coerced engagement counts, a cleaned
//! text column with URLs stripped, and a composite engagement score. Rows
//! whose timestamp cannot be parsed are dropped with a warning.

use crate::model::Post;
use crate::storage::query_slug;
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

/// A cleaned, enriched post row. Column order is the processed CSV layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedPost {
    pub author: String,
    pub text: String,
    pub hashtags: String,
    pub likes: u64,
    pub retweets: u64,
    pub replies: u64,
    pub views: u64,
    pub created_at: DateTime<Utc>,
    pub url: String,
    /// Calendar day of `created_at`.
    pub date: NaiveDate,
    /// Hour of day, 0-23.
    pub hour: u32,
    /// Day of week, 0 = Monday through 6 = Sunday.
    pub day_of_week: u32,
    /// `text` with URLs stripped and whitespace collapsed.
    pub text_clean: String,
    /// likes + 2*retweets + 0.1*views.
    pub engagement_score: f64,
}

/// Clean and enrich raw posts, newest first.
pub fn preprocess(posts: &[Post]) -> Vec<ProcessedPost> {
    let mut rows: Vec<ProcessedPost> = posts
        .iter()
        .filter_map(|post| {
            let created_at = match parse_timestamp(&post.created_at) {
                Some(dt) => dt,
                None => {
                    warn!("dropping row with unparsable timestamp {:?}", post.created_at);
                    return None;
                }
            };
            let likes = coerce_count(&post.likes);
            let retweets = coerce_count(&post.retweets);
            let replies = coerce_count(&post.replies);
            let views = coerce_count(&post.views);
            let author = if post.author.trim().is_empty() {
                "[deleted]".to_string()
            } else {
                post.author.clone()
            };
            let text_clean = clean_text(&post.text);

            Some(ProcessedPost {
                author,
                text: post.text.clone(),
                hashtags: post.hashtags.clone(),
                likes,
                retweets,
                replies,
                views,
                created_at,
                url: post.url.clone(),
                date: created_at.date_naive(),
                hour: created_at.hour(),
                day_of_week: created_at.weekday().num_days_from_monday(),
                text_clean,
                engagement_score: likes as f64 + 2.0 * retweets as f64 + 0.1 * views as f64,
            })
        })
        .collect();

    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    info!("preprocessed {} of {} posts", rows.len(), posts.len());
    rows
}

/// RFC 3339 first, then a naive local-less datetime as the fallback the
/// timestamp element sometimes produces.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a count string, tolerating thousands separators. Unparsable → 0.
fn coerce_count(s: &str) -> u64 {
    s.trim().replace(',', "").parse().unwrap_or(0)
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+|www\.\S+").expect("url pattern is valid"))
}

fn ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

/// Strip URLs and collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let without_urls = url_re().replace_all(text, "");
    ws_re().replace_all(&without_urls, " ").trim().to_string()
}

/// Write the processed set plus a plain-text summary alongside it.
pub fn save_processed(dir: &Path, query: &str, rows: &[ProcessedPost]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("processed_twitter_{}.csv", query_slug(query)));

    let mut wtr = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    let summary_path = dir.join(format!("processed_twitter_{}_summary.txt", query_slug(query)));
    std::fs::write(&summary_path, summarize(rows))
        .with_context(|| format!("failed to write {}", summary_path.display()))?;

    info!("saved {} processed rows to {}", rows.len(), path.display());
    Ok(path)
}

/// Load a processed set back for the report stage.
pub fn load_processed(path: &Path) -> Result<Vec<ProcessedPost>> {
    let mut raw = String::new();
    std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .read_to_string(&mut raw)?;
    let mut rdr = csv::Reader::from_reader(raw.as_bytes());
    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        rows.push(row.with_context(|| format!("bad row in {}", path.display()))?);
    }
    Ok(rows)
}

/// Expected processed-file path for a query.
pub fn processed_path(dir: &Path, query: &str) -> PathBuf {
    dir.join(format!("processed_twitter_{}.csv", query_slug(query)))
}

fn summarize(rows: &[ProcessedPost]) -> String {
    if rows.is_empty() {
        return "total_posts: 0\n".to_string();
    }
    let min = rows.iter().map(|r| r.created_at).min().unwrap();
    let max = rows.iter().map(|r| r.created_at).max().unwrap();
    let n = rows.len() as f64;
    let unique_authors = rows
        .iter()
        .map(|r| r.author.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();
    let avg = |f: fn(&ProcessedPost) -> u64| rows.iter().map(f).sum::<u64>() as f64 / n;

    format!(
        "total_posts: {}\ndate_range: {} ~ {}\nunique_authors: {}\navg_likes: {:.2}\navg_retweets: {:.2}\navg_views: {:.2}\n",
        rows.len(),
        min.to_rfc3339(),
        max.to_rfc3339(),
        unique_authors,
        avg(|r| r.likes),
        avg(|r| r.retweets),
        avg(|r| r.views),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(created_at: &str, likes: &str) -> Post {
        Post {
            author: "someone".to_string(),
            text: "look at this https://t.co/xyz  #meme".to_string(),
            hashtags: "#meme".to_string(),
            likes: likes.to_string(),
            retweets: "2".to_string(),
            replies: "1".to_string(),
            views: "100".to_string(),
            created_at: created_at.to_string(),
            url: format!("https://twitter.com/u/status/{created_at}"),
        }
    }

    #[test]
    fn test_clean_text_strips_urls() {
        assert_eq!(
            clean_text("look https://t.co/abc and www.example.com  here"),
            "look and here"
        );
    }

    #[test]
    fn test_coerce_count() {
        assert_eq!(coerce_count("42"), 42);
        assert_eq!(coerce_count("1,234"), 1234);
        assert_eq!(coerce_count(""), 0);
        assert_eq!(coerce_count("n/a"), 0);
    }

    #[test]
    fn test_temporal_fields() {
        // 2024-11-20 is a Wednesday
        let rows = preprocess(&[raw("2024-11-20T15:30:00Z", "10")]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].hour, 15);
        assert_eq!(rows[0].day_of_week, 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2024, 11, 20).unwrap());
    }

    #[test]
    fn test_engagement_score() {
        let rows = preprocess(&[raw("2024-11-20T15:30:00Z", "10")]);
        // 10 + 2*2 + 0.1*100
        assert!((rows[0].engagement_score - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_sorted_newest_first() {
        let rows = preprocess(&[
            raw("2024-11-18T00:00:00Z", "1"),
            raw("2024-11-20T00:00:00Z", "2"),
            raw("2024-11-19T00:00:00Z", "3"),
        ]);
        assert_eq!(rows[0].likes, 2);
        assert_eq!(rows[2].likes, 1);
    }

    #[test]
    fn test_unparsable_timestamp_dropped() {
        let rows = preprocess(&[raw("soon", "1"), raw("2024-11-20T00:00:00Z", "2")]);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_naive_timestamp_fallback() {
        let rows = preprocess(&[raw("2024-11-20T15:30:00.123", "1")]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].hour, 15);
    }

    #[test]
    fn test_empty_author_replaced() {
        let mut post = raw("2024-11-20T00:00:00Z", "1");
        post.author = "  ".to_string();
        let rows = preprocess(&[post]);
        assert_eq!(rows[0].author, "[deleted]");
    }

    #[test]
    fn test_save_and_load_processed() {
        let tmp = tempfile::tempdir().unwrap();
        let rows = preprocess(&[raw("2024-11-20T15:30:00Z", "10")]);
        let path = save_processed(tmp.path(), "Chill Guy", &rows).unwrap();
        assert_eq!(path, processed_path(tmp.path(), "Chill Guy"));

        let loaded = load_processed(&path).unwrap();
        assert_eq!(loaded, rows);

        let summary = std::fs::read_to_string(
            tmp.path().join("processed_twitter_chill_guy_summary.txt"),
        )
        .unwrap();
        assert!(summary.contains("total_posts: 1"));
        assert!(summary.contains("avg_likes: 10.00"));
    }
}
