//! `memetrace report <query>` — lifecycle analysis over the processed set.

use crate::cli::output::{is_quiet, Styled};
use crate::config::DataDirs;
use crate::{preprocess, report};
use anyhow::Result;
use std::path::PathBuf;

/// Run the report stage. Returns the report path, or `None` when no
/// processed set exists yet.
pub fn run(query: &str) -> Result<Option<PathBuf>> {
    let s = Styled::new();
    let dirs = DataDirs::resolve();
    dirs.ensure()?;

    let processed = preprocess::processed_path(&dirs.processed, query);
    if !processed.exists() {
        if !is_quiet() {
            eprintln!(
                "  {} no processed set for {query:?} (run preprocess first), skipping",
                s.warn_sym()
            );
        }
        return Ok(None);
    }

    let rows = preprocess::load_processed(&processed)?;
    let metrics = match report::analyze(&rows) {
        Some(m) => m,
        None => {
            if !is_quiet() {
                eprintln!("  {} processed set is empty, skipping", s.warn_sym());
            }
            return Ok(None);
        }
    };

    let path = report::write_report(&dirs.reports, query, &metrics)?;
    if !is_quiet() {
        eprintln!("  {} report written to {}", s.ok_sym(), path.display());
        eprintln!(
            "    peak {} posts on {}, {:.2} posts/day mean",
            metrics.peak_count, metrics.peak_date, metrics.mean_daily
        );
    }
    Ok(Some(path))
}
