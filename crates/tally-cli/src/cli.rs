//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Focus-time statistics.
///
/// Records stretches of focused work and reports daily, weekly and monthly
/// totals, goals, best records and a rolling recent-activity window.
#[derive(Debug, Parser)]
#[command(name = "tally", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a stretch of focused work.
    Record {
        /// Duration: minutes (25), "90m" or "1h 30m".
        duration: String,

        /// Category to file the time under.
        #[arg(long)]
        category: Option<String>,

        /// Number of sessions this entry stands for.
        #[arg(long, default_value_t = 1)]
        sessions: u32,

        /// When the work happened: ISO 8601 or relative ("2 hours ago").
        #[arg(long)]
        at: Option<String>,
    },

    /// Show today, this week and this month against the goals.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show yesterday, last week and last month.
    Previous {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show exact totals over a trailing window.
    Recent {
        /// Window length, e.g. "6h" or "90m". Defaults to the configured window.
        #[arg(long)]
        window: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show best day, week and month.
    Best {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show or change goals.
    Goals {
        #[command(subcommand)]
        action: Option<GoalsAction>,
    },

    /// Manage category labels.
    Labels {
        #[command(subcommand)]
        action: Option<LabelsAction>,
    },

    /// Remove buckets and raw events past their retention horizon.
    Cleanup {
        /// Run even if a sweep already ran in this process.
        #[arg(long)]
        force: bool,
    },
}

/// Goal subcommands.
#[derive(Debug, Subcommand)]
pub enum GoalsAction {
    /// Set one or more goals. Values are durations like "2h" or "90m".
    Set {
        #[arg(long)]
        daily: Option<String>,

        #[arg(long)]
        weekly: Option<String>,

        #[arg(long)]
        monthly: Option<String>,
    },
}

/// Label subcommands.
#[derive(Debug, Subcommand)]
pub enum LabelsAction {
    /// List labels.
    List,

    /// Add a label.
    Add { name: String },

    /// Remove a label. The last label cannot be removed.
    Remove { name: String },
}
