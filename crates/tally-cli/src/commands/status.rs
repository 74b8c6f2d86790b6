//! Status command: current periods against goals.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use tally_core::{BlobStore, Clock, PeriodView, StatsEngine, Summary};

use super::util::{format_minutes, plural, progress_bar, ranked};

#[derive(Serialize)]
struct StatusJson<'a> {
    timezone: String,
    #[serde(flatten)]
    summary: &'a Summary,
}

/// Formats one goal row.
pub fn format_goal_row(label: &str, view: &PeriodView, goal: u64, percent: f64) -> String {
    let total = view.bucket.total_minutes;
    format!(
        "{label:<12}{:>7} / {:<8}{} {percent:>4.0}%",
        format_minutes(total),
        format_minutes(goal),
        progress_bar(total, goal),
    )
}

/// Formats the human-readable status output.
pub fn format_status(summary: &Summary) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "FOCUS STATUS: {}",
        summary.generated_at.format("%A, %b %-d, %Y")
    )
    .unwrap();
    writeln!(output).unwrap();

    let rows = [
        ("Today", &summary.today, summary.goals.daily_minutes, summary.progress.daily),
        ("This week", &summary.this_week, summary.goals.weekly_minutes, summary.progress.weekly),
        ("This month", &summary.this_month, summary.goals.monthly_minutes, summary.progress.monthly),
    ];
    for (label, view, goal, percent) in rows {
        writeln!(output, "{}", format_goal_row(label, view, goal, percent)).unwrap();
    }

    writeln!(output).unwrap();
    let categories = ranked(&summary.today.bucket.category_breakdown);
    if categories.is_empty() {
        writeln!(output, "No focus time recorded today.").unwrap();
    } else {
        writeln!(output, "TODAY BY CATEGORY").unwrap();
        writeln!(output, "─────────────────").unwrap();
        for (name, minutes) in categories {
            writeln!(output, "  {name:<14}{:>7}", format_minutes(minutes)).unwrap();
        }
    }

    let lifetime = &summary.lifetime;
    writeln!(output).unwrap();
    writeln!(
        output,
        "Lifetime: {} in {} since {}",
        format_minutes(lifetime.total_minutes),
        plural(lifetime.total_sessions, "session"),
        lifetime.start_date
    )
    .unwrap();

    output
}

/// Formats the summary as JSON.
pub fn format_status_json(summary: &Summary, timezone: String) -> Result<String> {
    let json = StatusJson { timezone, summary };
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Runs the status command.
pub fn run<S: BlobStore, C: Clock, W: Write>(
    writer: &mut W,
    engine: &StatsEngine<S, C>,
    json: bool,
) -> Result<()> {
    let summary = engine.summary();
    if json {
        let timezone = iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string());
        writeln!(writer, "{}", format_status_json(&summary, timezone)?)?;
    } else {
        write!(writer, "{}", format_status(&summary))?;
    }
    Ok(())
}
