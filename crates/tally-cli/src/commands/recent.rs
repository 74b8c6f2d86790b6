//! Recent command: exact totals over a trailing window.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::Duration;
use tally_core::{BlobStore, Clock, RecentStats, StatsEngine};

use super::util::{format_minutes, parse_duration_minutes, plural, ranked};

pub fn format_recent(stats: &RecentStats) -> String {
    let mut output = String::new();
    let window = format_minutes(stats.window_minutes.unsigned_abs());
    if stats.event_count == 0 {
        writeln!(output, "LAST {window}: no focus time recorded.").unwrap();
        return output;
    }

    writeln!(
        output,
        "LAST {window}: {} in {}",
        format_minutes(stats.total_minutes),
        plural(stats.event_count as u64, "event")
    )
    .unwrap();
    writeln!(output).unwrap();
    for (name, minutes) in ranked(&stats.category_breakdown) {
        writeln!(output, "  {name:<14}{:>7}", format_minutes(minutes)).unwrap();
    }
    output
}

/// Runs the recent command. `window` overrides `default_minutes`.
pub fn run<S: BlobStore, C: Clock, W: Write>(
    writer: &mut W,
    engine: &StatsEngine<S, C>,
    window: Option<&str>,
    default_minutes: i64,
    json: bool,
) -> Result<()> {
    let minutes = match window {
        Some(raw) => parse_duration_minutes(raw)?,
        None => default_minutes,
    };
    if minutes <= 0 {
        anyhow::bail!("window must be positive, got {minutes} minutes");
    }

    let window = Duration::try_minutes(minutes)
        .with_context(|| format!("window of {minutes} minutes is too large"))?;
    let stats = engine.recent_stats(window);
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&stats)?)?;
    } else {
        write!(writer, "{}", format_recent(&stats))?;
    }
    Ok(())
}
