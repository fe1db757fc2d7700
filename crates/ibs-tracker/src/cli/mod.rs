//! Command-line interface for ibs-tracker.
//!
//! This module provides the CLI structure for the `ibstrack` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ClearCommand, ConfigCommand, CopyPreviousCommand, ExportCommand, ExportFormatArg,
    HistoryCommand, HistoryFilterArg, ImportCommand, ImportModeArg, LogCommand, SettingsCommand,
    ShowCommand, StatusCommand, TrendsCommand,
};

/// ibstrack - A daily digestive symptom journal
///
/// Record bowel movements, bloating, gas, triggers and cycle data one day at
/// a time, then compare recent weeks and spot patterns worth raising with a
/// doctor.
#[derive(Debug, Parser)]
#[command(name = "ibstrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record or update a day's entry
    Log(LogCommand),

    /// Copy the most recent earlier entry onto a day
    CopyPrevious(CopyPreviousCommand),

    /// Show a day's entry
    Show(ShowCommand),

    /// List recorded days, newest first
    History(HistoryCommand),

    /// Show trends and red flags
    Trends(TrendsCommand),

    /// Export the journal to a file
    Export(ExportCommand),

    /// Import a JSON backup
    Import(ImportCommand),

    /// Delete all data
    Clear(ClearCommand),

    /// Show journal and database status
    Status(StatusCommand),

    /// View or change display settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
