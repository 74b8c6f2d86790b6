//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{DateTime, Duration, FixedOffset};
use regex::Regex;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").unwrap());

/// `1h 30m`, `2h`, `45m`, `45min`.
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)\s*h(?:ours?|rs?)?)?\s*(?:(\d+)\s*m(?:in(?:utes?)?)?)?$").unwrap()
});

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Parse a duration in minutes.
///
/// Supports a bare number of minutes ("25") or hour/minute parts
/// ("90m", "1h 30m", "2h").
pub fn parse_duration_minutes(s: &str) -> anyhow::Result<i64> {
    let trimmed = s.trim().to_lowercase();
    if let Ok(minutes) = trimmed.parse::<i64>() {
        return Ok(minutes);
    }

    let caps = DURATION_RE
        .captures(&trimmed)
        .filter(|caps| caps.get(1).is_some() || caps.get(2).is_some());
    let Some(caps) = caps else {
        anyhow::bail!("Invalid duration: {s}. Use minutes (e.g., 25), '90m' or '1h 30m'");
    };

    let part = |index: usize| -> anyhow::Result<i64> {
        caps.get(index).map_or(Ok(0), |m| {
            m.as_str()
                .parse::<i64>()
                .with_context(|| format!("duration component too large: {}", m.as_str()))
        })
    };
    let hours = part(1)?;
    let minutes = part(2)?;

    hours
        .checked_mul(60)
        .and_then(|h| h.checked_add(minutes))
        .with_context(|| format!("duration too large: {s}"))
}

/// Parse a datetime string as either ISO 8601 or relative time.
///
/// Supports:
/// - ISO 8601: "2026-01-15T10:30:00Z", shown in the offset of `now`
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_datetime(s: &str, now: DateTime<FixedOffset>) -> anyhow::Result<DateTime<FixedOffset>> {
    // Try ISO 8601 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&now.timezone()));
    }

    // Try relative time: "N hours/minutes/days/weeks ago"
    let Some(caps) = RELATIVE_TIME_RE.captures(s.trim()) else {
        anyhow::bail!(
            "Invalid datetime: {s}. Use ISO 8601 (e.g., 2026-01-15T10:30:00Z) or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    let duration = Duration::minutes(n * minutes_per_unit);
    Ok(now - duration)
}

/// Formats minutes as "Xh Ym" if >= 1 hour, "Xm" otherwise.
pub fn format_minutes(minutes: u64) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    if hours >= 1 {
        format!("{hours}h {rest}m")
    } else {
        format!("{rest}m")
    }
}

/// Generates a 10-character progress bar.
/// Values <5% of max get a single block for visibility.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn progress_bar(value: u64, max: u64) -> String {
    if max == 0 {
        return "░░░░░░░░░░".to_string();
    }

    let ratio = value as f64 / max as f64;
    let filled = if ratio < 0.05 && value > 0 {
        1
    } else {
        (ratio * 10.0).round().min(10.0) as usize
    };

    let empty = 10 - filled;
    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}

/// "1 session", "3 sessions".
pub fn plural(count: u64, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Categories ordered by minutes, largest first; ties by name.
pub fn ranked<'a>(
    breakdown: impl IntoIterator<Item = (&'a String, &'a u64)>,
) -> Vec<(&'a str, u64)> {
    let mut rows: Vec<(&str, u64)> = breakdown
        .into_iter()
        .filter(|(_, minutes)| **minutes > 0)
        .map(|(name, minutes)| (name.as_str(), *minutes))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    rows
}
