//! `memetrace run <query>` — the full pipeline: collect, preprocess, report.
//!
//! A fatal collection fault aborts the collection stage only; the later
//! stages observe "no input available" and skip gracefully instead of
//! crashing the whole run.

use crate::cli::output::{stage_banner, Styled};
use crate::cli::{collect_cmd, preprocess_cmd, report_cmd};
use anyhow::Result;
use std::path::Path;
use tracing::warn;

pub async fn run(
    query: &str,
    max_posts: Option<usize>,
    skip_collection: bool,
    show_browser: bool,
    cookie_path: &Path,
) -> Result<()> {
    let s = Styled::new();

    if skip_collection {
        stage_banner(&format!("Stage 1: collection (skipped) - {query}"));
    } else {
        stage_banner(&format!("Stage 1: collecting posts - {query}"));
        match collect_cmd::run(query, max_posts, show_browser, cookie_path).await {
            Ok(_) => {}
            Err(e) => {
                // Collection faults must not sink the pipeline: older
                // captures may still exist for the later stages.
                warn!("collection stage failed: {e:#}");
                eprintln!("  {} collection failed: {e:#}", s.err_sym());
            }
        }
    }

    stage_banner("Stage 2: preprocessing");
    preprocess_cmd::run(query)?;

    stage_banner("Stage 3: lifecycle report");
    report_cmd::run(query)?;

    stage_banner("Pipeline finished");
    Ok(())
}
