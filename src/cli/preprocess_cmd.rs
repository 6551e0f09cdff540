//! `memetrace preprocess <query>` — clean the latest raw capture.

use crate::cli::output::{is_quiet, Styled};
use crate::config::DataDirs;
use crate::{preprocess, storage};
use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Run the preprocessing stage. Returns the processed CSV path, or `None`
/// when there is nothing to preprocess.
pub fn run(query: &str) -> Result<Option<PathBuf>> {
    let s = Styled::new();
    let dirs = DataDirs::resolve();
    dirs.ensure()?;

    let raw_file = match storage::latest_raw_file(&dirs.raw, query)? {
        Some(p) => p,
        None => {
            if !is_quiet() {
                eprintln!("  {} no raw captures for {query:?}, skipping", s.warn_sym());
            }
            return Ok(None);
        }
    };
    info!("preprocessing {}", raw_file.display());

    let posts = storage::load_posts(&raw_file)?;
    if posts.is_empty() {
        if !is_quiet() {
            eprintln!("  {} raw capture is empty, skipping", s.warn_sym());
        }
        return Ok(None);
    }

    let rows = preprocess::preprocess(&posts);
    let path = preprocess::save_processed(&dirs.processed, query, &rows)?;
    if !is_quiet() {
        eprintln!(
            "  {} {} rows preprocessed to {}",
            s.ok_sym(),
            rows.len(),
            path.display()
        );
    }
    Ok(Some(path))
}
