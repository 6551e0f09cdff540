//! CSV persistence for raw captures and processed sets.
//!
//! Raw files are written UTF-8 with a byte-order mark so spreadsheet tools
//! open them with the right encoding, one header row, one row per record,
//! filename embedding the query slug and the collection timestamp.

use crate::model::Post;
use anyhow::{Context, Result};
use chrono::Local;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const BOM: &[u8] = "\u{feff}".as_bytes();

/// Lowercased, underscore-joined form of the query used in filenames.
pub fn query_slug(query: &str) -> String {
    query.trim().to_lowercase().replace(' ', "_")
}

/// Persist a collection run. Returns the written path, or `None` when there
/// was nothing to write.
pub fn save_posts(dir: &Path, query: &str, posts: &[Post]) -> Result<Option<PathBuf>> {
    if posts.is_empty() {
        warn!("no posts to save for {query:?}");
        return Ok(None);
    }
    std::fs::create_dir_all(dir)?;

    let filename = format!(
        "twitter_{}_{}.csv",
        query_slug(query),
        Local::now().format("%Y%m%d_%H%M%S")
    );
    let path = dir.join(filename);

    let mut file = File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(BOM)?;

    let mut wtr = csv::Writer::from_writer(file);
    for post in posts {
        wtr.serialize(post)?;
    }
    wtr.flush()?;

    info!("saved {} posts to {}", posts.len(), path.display());
    Ok(Some(path))
}

/// Load a capture back, tolerating a leading byte-order mark.
pub fn load_posts(path: &Path) -> Result<Vec<Post>> {
    let mut raw = String::new();
    File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .read_to_string(&mut raw)?;
    let trimmed = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let mut rdr = csv::Reader::from_reader(trimmed.as_bytes());
    let mut posts = Vec::new();
    for row in rdr.deserialize() {
        let post: Post = row.with_context(|| format!("bad row in {}", path.display()))?;
        posts.push(post);
    }
    Ok(posts)
}

/// The most recent raw capture for a query, by modification time.
pub fn latest_raw_file(dir: &Path, query: &str) -> Result<Option<PathBuf>> {
    let prefix = format!("twitter_{}_", query_slug(query));
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return Ok(None),
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };
        if !name.starts_with(&prefix) || !name.ends_with(".csv") {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
        if newest.as_ref().map(|(t, _)| modified > *t).unwrap_or(true) {
            newest = Some((modified, path));
        }
    }
    Ok(newest.map(|(_, p)| p))
}
