//! Focus statistics CLI library.
//!
//! This crate provides the CLI interface over `tally-core`.

mod cli;
pub mod commands;
mod config;
pub mod mirror;
pub mod store;

pub use cli::{Cli, Commands, GoalsAction, LabelsAction};
pub use config::{Backend, Config};
