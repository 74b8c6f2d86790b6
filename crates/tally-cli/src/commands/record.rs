//! Record command for logging a stretch of focused work.

use std::io::Write;

use anyhow::{Context, Result};
use tally_core::{BlobStore, Clock, Granularity, StatsEngine, normalize_category};

use super::util::{format_minutes, parse_datetime, parse_duration_minutes};

pub fn run<S: BlobStore, C: Clock, W: Write>(
    writer: &mut W,
    engine: &mut StatsEngine<S, C>,
    duration: &str,
    category: Option<&str>,
    sessions: u32,
    at: Option<&str>,
) -> Result<()> {
    let minutes = parse_duration_minutes(duration)?;
    let at = match at {
        Some(raw) => parse_datetime(raw, engine.clock().now())?,
        None => engine.clock().now(),
    };
    let category = normalize_category(category.unwrap_or_default());

    let outcome = engine
        .record_at(at, minutes, &category, sessions)
        .context("failed to record focus time")?;

    if !outcome.recorded {
        writeln!(writer, "Nothing recorded: duration must be positive.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "Recorded {} of {category} on {}.",
        format_minutes(minutes.unsigned_abs()),
        outcome.day.period_key
    )?;
    writeln!(
        writer,
        "Day: {} | Week: {} | Month: {}",
        format_minutes(outcome.day.bucket.total_minutes),
        format_minutes(outcome.week.bucket.total_minutes),
        format_minutes(outcome.month.bucket.total_minutes),
    )?;
    for granularity in &outcome.new_records {
        let total = match granularity {
            Granularity::Day => outcome.day.bucket.total_minutes,
            Granularity::Week => outcome.week.bucket.total_minutes,
            Granularity::Month => outcome.month.bucket.total_minutes,
        };
        writeln!(writer, "New best {granularity}: {}", format_minutes(total))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    use crate::commands::testing::{engine, output, saturday};

    #[test]
    fn test_record_reports_totals_and_records() {
        let clock = saturday();
        let mut engine = engine(&clock);
        run(&mut Vec::new(), &mut engine, "25", Some("Study"), 1, None).unwrap();

        let mut buf = Vec::new();
        run(&mut buf, &mut engine, "1h 5m", Some("programming"), 2, None).unwrap();

        assert_snapshot!(output(buf), @r"
        Recorded 1h 5m of programming on 2026-10-17.
        Day: 1h 30m | Week: 1h 30m | Month: 1h 30m
        New best day: 1h 30m
        New best week: 1h 30m
        New best month: 1h 30m
        ");
        assert_eq!(engine.today().bucket.session_count, 3);
        assert_eq!(engine.today().bucket.minutes_for("study"), 25);
    }

    #[test]
    fn test_record_at_earlier_day() {
        let clock = saturday();
        let mut engine = engine(&clock);
        run(&mut Vec::new(), &mut engine, "2h", Some("work"), 1, None).unwrap();

        let mut buf = Vec::new();
        run(&mut buf, &mut engine, "30m", None, 1, Some("1 day ago")).unwrap();

        assert_snapshot!(output(buf), @r"
        Recorded 30m of uncategorized on 2026-10-16.
        Day: 30m | Week: 30m | Month: 2h 30m
        New best month: 2h 30m
        ");
    }

    #[test]
    fn test_record_zero_is_noop() {
        let clock = saturday();
        let mut engine = engine(&clock);

        let mut buf = Vec::new();
        run(&mut buf, &mut engine, "0", Some("study"), 1, None).unwrap();

        assert_snapshot!(output(buf), @"Nothing recorded: duration must be positive.");
        assert_eq!(engine.store().writes(), 0);
    }

    #[test]
    fn test_record_rejects_bad_duration() {
        let clock = saturday();
        let mut engine = engine(&clock);
        let err = run(&mut Vec::new(), &mut engine, "soon", None, 1, None).unwrap_err();
        assert!(err.to_string().contains("Invalid duration"));
    }
}
