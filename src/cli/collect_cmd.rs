//! `memetrace collect <query>` — scroll-collect posts into a raw CSV.

use crate::auth;
use crate::browser::chromium::ChromiumSession;
use crate::browser::{live_search_url, FeedSession};
use crate::cli::output::{is_quiet, Styled};
use crate::collector::Scanner;
use crate::config::{DataDirs, ScanConfig};
use crate::storage;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Run the collection stage. Returns the raw CSV path, or `None` when the
/// scan produced nothing worth writing.
pub async fn run(
    query: &str,
    max_posts: Option<usize>,
    show_browser: bool,
    cookie_path: &Path,
) -> Result<Option<PathBuf>> {
    let s = Styled::new();
    let dirs = DataDirs::resolve();
    dirs.ensure()?;

    let cookies = auth::load_cookies(cookie_path)?;
    info!("loaded {} cookies from {}", cookies.len(), cookie_path.display());

    let session = ChromiumSession::launch(!show_browser)
        .await
        .context("failed to launch browser")?;
    if !is_quiet() {
        eprintln!("  {} browser launched", s.ok_sym());
    }

    let outcome = collect_with(&session, query, max_posts, &cookies).await;
    let session: Box<dyn FeedSession> = Box::new(session);
    let _ = session.close().await;

    let outcome = outcome?;
    if let Some(fault) = &outcome.fault {
        eprintln!("  {} scan cut short: {fault}", s.warn_sym());
    }
    if outcome.posts.is_empty() {
        if !is_quiet() {
            eprintln!("  {} no posts collected for {query:?}", s.warn_sym());
        }
        return Ok(None);
    }

    let path = storage::save_posts(&dirs.raw, query, &outcome.posts)?;
    if let Some(ref p) = path {
        if !is_quiet() {
            eprintln!(
                "  {} {} posts saved to {}",
                s.ok_sym(),
                outcome.posts.len(),
                p.display()
            );
        }
    }
    Ok(path)
}

async fn collect_with(
    session: &ChromiumSession,
    query: &str,
    max_posts: Option<usize>,
    cookies: &[auth::Cookie],
) -> Result<crate::collector::ScanOutcome> {
    session
        .apply_cookies("https://twitter.com", cookies)
        .await
        .context("cookie replay failed")?;
    info!("cookies applied, session authenticated");

    let url = live_search_url(query);
    session.navigate(&url).await?;
    // Let the result view settle before the scanner starts polling
    tokio::time::sleep(Duration::from_secs(3)).await;

    let scanner = Scanner::new(ScanConfig::default());
    let outcome = scanner.scan(session, query, max_posts).await?;
    if outcome.posts.is_empty() {
        warn!("scan of {query:?} yielded no posts");
    }
    Ok(outcome)
}
