//! Best command: all-time best day, week and month.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use tally_core::{BestRecords, BlobStore, Clock, Granularity, StatsEngine};

use super::util::{format_minutes, plural};

pub fn format_best(records: &BestRecords) -> String {
    let mut output = String::new();
    writeln!(output, "BEST RECORDS").unwrap();
    writeln!(output).unwrap();
    for (label, granularity) in [
        ("Day", Granularity::Day),
        ("Week", Granularity::Week),
        ("Month", Granularity::Month),
    ] {
        let record = records.get(granularity);
        if record.minutes == 0 {
            writeln!(output, "{label:<8}none yet").unwrap();
            continue;
        }
        writeln!(
            output,
            "{label:<8}{:<9}{}  ({})",
            format_minutes(record.minutes),
            record.period_key,
            plural(record.sessions, "session"),
        )
        .unwrap();
    }
    output
}

/// Runs the best command.
pub fn run<S: BlobStore, C: Clock, W: Write>(
    writer: &mut W,
    engine: &StatsEngine<S, C>,
    json: bool,
) -> Result<()> {
    let records = engine.best_records();
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(records)?)?;
    } else {
        write!(writer, "{}", format_best(records))?;
    }
    Ok(())
}
