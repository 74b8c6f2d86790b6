//! Labels command: list, add and remove category labels.

use std::io::Write;

use anyhow::{Context, Result};
use tally_core::{BlobStore, Clock, LabelChange, StatsEngine};

pub fn list<S: BlobStore, C: Clock, W: Write>(
    writer: &mut W,
    engine: &StatsEngine<S, C>,
) -> Result<()> {
    for label in engine.labels() {
        writeln!(writer, "{label}")?;
    }
    Ok(())
}

pub fn add<S: BlobStore, C: Clock, W: Write>(
    writer: &mut W,
    engine: &mut StatsEngine<S, C>,
    name: &str,
) -> Result<()> {
    let change = engine.add_label(name).context("failed to save labels")?;
    report(writer, change, name)
}

pub fn remove<S: BlobStore, C: Clock, W: Write>(
    writer: &mut W,
    engine: &mut StatsEngine<S, C>,
    name: &str,
) -> Result<()> {
    let change = engine.remove_label(name).context("failed to save labels")?;
    report(writer, change, name)
}

fn report<W: Write>(writer: &mut W, change: LabelChange, name: &str) -> Result<()> {
    let name = name.trim().to_lowercase();
    match change {
        LabelChange::Added => writeln!(writer, "Added label '{name}'.")?,
        LabelChange::AlreadyPresent => writeln!(writer, "Label '{name}' already exists.")?,
        LabelChange::Removed => writeln!(writer, "Removed label '{name}'.")?,
        LabelChange::NotFound => writeln!(writer, "No label named '{name}'.")?,
        LabelChange::LastLabel => {
            writeln!(writer, "Cannot remove '{name}': at least one label is required.")?;
        }
        LabelChange::Blank => writeln!(writer, "Label name is empty.")?,
    }
    Ok(())
}
