//! Goals command: show or change focus goals.

use std::io::Write;

use anyhow::{Context, Result};
use tally_core::{BlobStore, Clock, Goals, StatsEngine};

use super::util::{format_minutes, parse_duration_minutes};

fn write_goals<W: Write>(writer: &mut W, goals: &Goals) -> Result<()> {
    writeln!(writer, "Daily goal:    {}", format_minutes(goals.daily_minutes))?;
    writeln!(writer, "Weekly goal:   {}", format_minutes(goals.weekly_minutes))?;
    writeln!(writer, "Monthly goal:  {}", format_minutes(goals.monthly_minutes))?;
    Ok(())
}

fn parse_goal(raw: Option<&str>, current: u64) -> Result<u64> {
    let Some(raw) = raw else {
        return Ok(current);
    };
    let minutes = parse_duration_minutes(raw)?;
    u64::try_from(minutes).with_context(|| format!("goal must not be negative: {raw}"))
}

/// Prints the current goals.
pub fn show<S: BlobStore, C: Clock, W: Write>(
    writer: &mut W,
    engine: &StatsEngine<S, C>,
) -> Result<()> {
    write_goals(writer, &engine.goals())
}

/// Updates the given goals, keeping the others.
pub fn set<S: BlobStore, C: Clock, W: Write>(
    writer: &mut W,
    engine: &mut StatsEngine<S, C>,
    daily: Option<&str>,
    weekly: Option<&str>,
    monthly: Option<&str>,
) -> Result<()> {
    if daily.is_none() && weekly.is_none() && monthly.is_none() {
        anyhow::bail!("nothing to set; pass --daily, --weekly or --monthly");
    }

    let current = engine.goals();
    let requested = [
        ("daily", parse_goal(daily, current.daily_minutes)?),
        ("weekly", parse_goal(weekly, current.weekly_minutes)?),
        ("monthly", parse_goal(monthly, current.monthly_minutes)?),
    ];
    let stored = engine
        .set_goals(requested[0].1, requested[1].1, requested[2].1)
        .context("failed to save goals")?;

    let applied = [
        stored.daily_minutes,
        stored.weekly_minutes,
        stored.monthly_minutes,
    ];
    for ((name, wanted), applied) in requested.into_iter().zip(applied) {
        if applied > wanted {
            writeln!(
                writer,
                "Raised {name} goal to the {} minimum.",
                format_minutes(applied)
            )?;
        }
    }
    write_goals(writer, &stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    use crate::commands::testing::{engine, output, saturday};

    #[test]
    fn test_show_defaults() {
        let clock = saturday();
        let engine = engine(&clock);

        let mut buf = Vec::new();
        show(&mut buf, &engine).unwrap();

        assert_snapshot!(output(buf), @r"
        Daily goal:    2h 0m
        Weekly goal:   14h 0m
        Monthly goal:  60h 0m
        ");
    }

    #[test]
    fn test_set_clamps_and_keeps_unset_goals() {
        let clock = saturday();
        let mut engine = engine(&clock);

        let mut buf = Vec::new();
        set(&mut buf, &mut engine, Some("10"), Some("20h"), None).unwrap();

        assert_snapshot!(output(buf), @r"
        Raised daily goal to the 30m minimum.
        Daily goal:    30m
        Weekly goal:   20h 0m
        Monthly goal:  60h 0m
        ");
        assert_eq!(engine.goals().weekly_minutes, 1200);
    }

    #[test]
    fn test_set_requires_a_value() {
        let clock = saturday();
        let mut engine = engine(&clock);
        assert!(set(&mut Vec::new(), &mut engine, None, None, None).is_err());
        assert!(set(&mut Vec::new(), &mut engine, Some("-5"), None, None).is_err());
    }
}
