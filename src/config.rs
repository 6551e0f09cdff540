//! Data directory layout and scan tuning knobs.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Where pipeline artifacts live: raw captures, processed sets, reports.
#[derive(Debug, Clone)]
pub struct DataDirs {
    pub raw: PathBuf,
    pub processed: PathBuf,
    pub reports: PathBuf,
}

impl DataDirs {
    /// Resolve the data root: `$MEMETRACE_DATA_DIR`, else `~/.memetrace/data`.
    pub fn resolve() -> Self {
        let root = std::env::var("MEMETRACE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".memetrace/data")
            });
        Self::rooted_at(root)
    }

    /// Lay the standard subdirectories out under an explicit root.
    pub fn rooted_at(root: PathBuf) -> Self {
        Self {
            raw: root.join("raw"),
            processed: root.join("processed"),
            reports: root.join("reports"),
        }
    }

    /// Create all three directories if missing.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.raw, &self.processed, &self.reports] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Default cookie file path: `~/.memetrace/cookies.json`.
pub fn default_cookie_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".memetrace/cookies.json")
}

/// Tuning knobs for the scroll-and-collect loop.
///
/// The two-strike termination (no new cards, then no height growth) is a
/// heuristic tuned to one feed's virtualization behavior; the wait and settle
/// durations are knobs rather than constants so a slower feed can be
/// accommodated without touching the loop.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Bound on the wait for the first card to render.
    pub initial_wait: Duration,
    /// How often to re-poll for the first card during the initial wait.
    pub poll_interval: Duration,
    /// Pause after each scroll so lazily loaded cards can render.
    pub settle_delay: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            initial_wait: Duration::from_secs(15),
            poll_interval: Duration::from_millis(500),
            settle_delay: Duration::from_secs(3),
        }
    }
}
