//! Lifecycle analysis and text report.
//!
//! Reads the processed set and characterizes the trend curve: daily volume
//! (gap days filled with zero), the 7-day moving average, peak day, growth
//! phase length, and the decline rate from peak to the end of the window.

use crate::preprocess::ProcessedPost;
use crate::storage::query_slug;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Aggregate lifecycle metrics for one query's processed set.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleMetrics {
    pub total_posts: usize,
    pub unique_authors: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub peak_date: NaiveDate,
    pub peak_count: u64,
    pub mean_daily: f64,
    /// Days from first sighting to the peak day.
    pub growth_days: i64,
    /// Mean posts lost per day from the peak to the last observed day.
    /// Zero when the peak is the final day.
    pub decline_rate: f64,
    pub total_engagement: f64,
    /// Per-day post counts, consecutive from first to last date.
    pub daily_counts: Vec<(NaiveDate, u64)>,
    /// 7-day trailing moving average over `daily_counts`.
    pub moving_avg: Vec<(NaiveDate, f64)>,
}

/// Compute lifecycle metrics. `None` for an empty set.
pub fn analyze(rows: &[ProcessedPost]) -> Option<LifecycleMetrics> {
    if rows.is_empty() {
        return None;
    }

    let mut by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for row in rows {
        *by_day.entry(row.date).or_insert(0) += 1;
    }
    let first_date = *by_day.keys().next()?;
    let last_date = *by_day.keys().next_back()?;

    // Fill calendar gaps so the curve and decline rate see quiet days.
    let mut daily_counts = Vec::new();
    let mut day = first_date;
    while day <= last_date {
        daily_counts.push((day, by_day.get(&day).copied().unwrap_or(0)));
        day = day.succ_opt()?;
    }

    let moving_avg: Vec<(NaiveDate, f64)> = daily_counts
        .iter()
        .enumerate()
        .map(|(i, &(d, _))| {
            let window = &daily_counts[i.saturating_sub(6)..=i];
            let sum: u64 = window.iter().map(|&(_, c)| c).sum();
            (d, sum as f64 / window.len() as f64)
        })
        .collect();

    let (peak_date, peak_count) = daily_counts
        .iter()
        .max_by_key(|&&(d, c)| (c, std::cmp::Reverse(d)))
        .copied()
        .unwrap();

    let span_days = daily_counts.len() as f64;
    let mean_daily = rows.len() as f64 / span_days;
    let growth_days = (peak_date - first_date).num_days();

    let decline_span = (last_date - peak_date).num_days();
    let last_count = daily_counts.last().map(|&(_, c)| c).unwrap_or(0);
    let decline_rate = if decline_span > 0 {
        (peak_count as f64 - last_count as f64) / decline_span as f64
    } else {
        0.0
    };

    let unique_authors = rows
        .iter()
        .map(|r| r.author.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();

    Some(LifecycleMetrics {
        total_posts: rows.len(),
        unique_authors,
        first_date,
        last_date,
        peak_date,
        peak_count,
        mean_daily,
        growth_days,
        decline_rate,
        total_engagement: rows.iter().map(|r| r.engagement_score).sum(),
        daily_counts,
        moving_avg,
    })
}

/// Render the metrics as a plain-text report file.
pub fn write_report(dir: &Path, query: &str, metrics: &LifecycleMetrics) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("twitter_{}_report.txt", query_slug(query)));
    std::fs::write(&path, render(query, metrics))
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote lifecycle report to {}", path.display());
    Ok(path)
}

fn render(query: &str, m: &LifecycleMetrics) -> String {
    let mut out = String::new();
    let line = "=".repeat(50);
    out.push_str(&format!("{line}\n Meme lifecycle report: {query}\n"));
    out.push_str(&format!(
        " Generated: {}\n{line}\n\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));

    out.push_str(&format!(" Posts analyzed:   {}\n", m.total_posts));
    out.push_str(&format!(" Unique authors:   {}\n", m.unique_authors));
    out.push_str(&format!(
        " Date range:       {} - {} ({} days)\n",
        m.first_date,
        m.last_date,
        m.daily_counts.len()
    ));
    out.push_str(&format!(
        " Peak day:         {} ({} posts)\n",
        m.peak_date, m.peak_count
    ));
    out.push_str(&format!(" Mean daily posts: {:.2}\n", m.mean_daily));
    out.push_str(&format!(
        " Growth phase:     {} days from first sighting to peak\n",
        m.growth_days
    ));
    out.push_str(&format!(
        " Decline rate:     {:.2} posts/day from peak to end\n",
        m.decline_rate
    ));
    out.push_str(&format!(" Total engagement: {:.1}\n\n", m.total_engagement));

    out.push_str(" Daily posts (7-day moving average):\n");
    for (&(date, count), &(_, avg)) in m.daily_counts.iter().zip(m.moving_avg.iter()) {
        out.push_str(&format!("   {date}  {count:>5}  ({avg:.1})\n"));
    }
    out
}
