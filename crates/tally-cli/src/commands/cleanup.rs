//! Cleanup command: apply the retention policy.

use std::io::Write;

use anyhow::{Context, Result};
use tally_core::{BlobStore, CleanupReport, Clock, StatsEngine};

use super::util::plural;

pub fn format_cleanup(report: &CleanupReport) -> String {
    if report.skipped {
        return "Cleanup already ran; use --force to sweep again.".to_string();
    }
    let removed = report.removed_days
        + report.removed_weeks
        + report.removed_months
        + report.removed_events;
    if removed == 0 {
        return "Nothing to clean up.".to_string();
    }
    let count = |n: usize, noun: &str| plural(n as u64, noun);
    format!(
        "Removed {}, {}, {} and {}.",
        count(report.removed_days, "day bucket"),
        count(report.removed_weeks, "week bucket"),
        count(report.removed_months, "month bucket"),
        count(report.removed_events, "raw event"),
    )
}

/// Runs the cleanup command.
pub fn run<S: BlobStore, C: Clock, W: Write>(
    writer: &mut W,
    engine: &mut StatsEngine<S, C>,
    force: bool,
) -> Result<()> {
    let report = if force {
        engine.cleanup_forced()
    } else {
        engine.cleanup()
    }
    .context("cleanup failed")?;
    writeln!(writer, "{}", format_cleanup(&report))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::DateTime;
    use insta::assert_snapshot;

    use crate::commands::testing::{engine, output, saturday};

    #[test]
    fn test_cleanup_reports_removals() {
        let clock = saturday();
        let mut engine = engine(&clock);
        let old = DateTime::parse_from_rfc3339("2026-08-01T10:00:00+02:00").unwrap();
        engine.record_at(old, 50, "work", 1).unwrap();

        let mut buf = Vec::new();
        run(&mut buf, &mut engine, false).unwrap();
        run(&mut buf, &mut engine, false).unwrap();
        run(&mut buf, &mut engine, true).unwrap();

        assert_snapshot!(output(buf), @r"
        Removed 1 day bucket, 0 week buckets, 0 month buckets and 1 raw event.
        Cleanup already ran; use --force to sweep again.
        Nothing to clean up.
        ");
        assert_eq!(engine.lifetime().total_minutes, 50);
    }
}
