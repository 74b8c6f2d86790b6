//! Previous command: the periods before the current ones.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use tally_core::{BlobStore, Clock, PeriodView, StatsEngine};

use super::util::{format_minutes, plural};

#[derive(Debug, Serialize)]
pub struct PreviousReport {
    pub day: PeriodView,
    pub week: PeriodView,
    pub month: PeriodView,
}

impl PreviousReport {
    pub fn collect<S: BlobStore, C: Clock>(engine: &StatsEngine<S, C>) -> Self {
        Self {
            day: engine.previous_day(),
            week: engine.previous_week(),
            month: engine.previous_month(),
        }
    }
}

pub fn format_previous(report: &PreviousReport) -> String {
    let mut output = String::new();
    writeln!(output, "PREVIOUS PERIODS").unwrap();
    writeln!(output).unwrap();
    for (label, view) in [
        ("Yesterday", &report.day),
        ("Last week", &report.week),
        ("Last month", &report.month),
    ] {
        writeln!(
            output,
            "{label:<12}{:<12}{:>7}  {}",
            view.period_key,
            format_minutes(view.bucket.total_minutes),
            plural(view.bucket.session_count, "session"),
        )
        .unwrap();
    }
    output
}

/// Runs the previous command.
pub fn run<S: BlobStore, C: Clock, W: Write>(
    writer: &mut W,
    engine: &StatsEngine<S, C>,
    json: bool,
) -> Result<()> {
    let report = PreviousReport::collect(engine);
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_previous(&report))?;
    }
    Ok(())
}
