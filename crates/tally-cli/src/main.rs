use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tally_cli::commands::{best, cleanup, goals, labels, previous, recent, record, status};
use tally_cli::store::{Engine, open_engine};
use tally_cli::{Cli, Commands, Config, GoalsAction, LabelsAction};

/// Load config and open the engine.
fn open(config_path: Option<&Path>) -> Result<(Engine, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    let engine = open_engine(&config)?;
    Ok((engine, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut engine, config) = open(cli.config.as_deref())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Record {
            duration,
            category,
            sessions,
            at,
        } => record::run(
            &mut out,
            &mut engine,
            duration,
            category.as_deref(),
            *sessions,
            at.as_deref(),
        )?,
        Commands::Status { json } => status::run(&mut out, &engine, *json)?,
        Commands::Previous { json } => previous::run(&mut out, &engine, *json)?,
        Commands::Recent { window, json } => recent::run(
            &mut out,
            &engine,
            window.as_deref(),
            config.recent_window_minutes,
            *json,
        )?,
        Commands::Best { json } => best::run(&mut out, &engine, *json)?,
        Commands::Goals { action } => match action {
            None => goals::show(&mut out, &engine)?,
            Some(GoalsAction::Set {
                daily,
                weekly,
                monthly,
            }) => goals::set(
                &mut out,
                &mut engine,
                daily.as_deref(),
                weekly.as_deref(),
                monthly.as_deref(),
            )?,
        },
        Commands::Labels { action } => match action {
            None | Some(LabelsAction::List) => labels::list(&mut out, &engine)?,
            Some(LabelsAction::Add { name }) => labels::add(&mut out, &mut engine, name)?,
            Some(LabelsAction::Remove { name }) => labels::remove(&mut out, &mut engine, name)?,
        },
        Commands::Cleanup { force } => cleanup::run(&mut out, &mut engine, *force)?,
    }

    out.flush()?;
    Ok(())
}
