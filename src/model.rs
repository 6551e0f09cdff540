//! The post record — the unit of collection.

use serde::{Deserialize, Serialize};

/// One collected post. Field order here is the CSV column order, so keep it
/// stable: author, text, hashtags, likes, retweets, replies, views,
/// created_at, url.
///
/// Engagement counts stay as strings at this layer; they are captured once at
/// first sighting and coerced to numbers only during preprocessing. `url` is
/// the permalink and the deduplication identity — unique across any scan
/// output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Display name of the author; `"unknown"` if unresolved.
    pub author: String,
    /// All text fragments of the card, whitespace-joined.
    pub text: String,
    /// Comma-joined `#\w+` matches from `text`.
    pub hashtags: String,
    pub likes: String,
    pub retweets: String,
    pub replies: String,
    pub views: String,
    /// RFC 3339 timestamp from the card's time element, or the collection
    /// wall clock if the card carried none.
    pub created_at: String,
    /// Permalink. Unique identity key.
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_column_order() {
        let post = Post {
            author: "someone".to_string(),
            text: "a post".to_string(),
            hashtags: String::new(),
            likes: "1".to_string(),
            retweets: "2".to_string(),
            replies: "3".to_string(),
            views: "4".to_string(),
            created_at: "2024-11-20T12:00:00Z".to_string(),
            url: "https://twitter.com/u/status/1".to_string(),
        };

        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.serialize(&post).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        let header = out.lines().next().unwrap();
        assert_eq!(
            header,
            "author,text,hashtags,likes,retweets,replies,views,created_at,url"
        );
    }
}
