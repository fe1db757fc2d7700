//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::entry::{parse_date, Ease, Entry, GasSmell, Laxative, PeriodStatus, PeriodSymptom};
use crate::export::ExportFormat;
use crate::gateway::ImportMode;
use crate::history::HistoryFilter;

/// Parse a `YYYY-MM-DD` argument.
fn date_arg(input: &str) -> Result<NaiveDate, String> {
    parse_date(input).map_err(|e| e.to_string())
}

/// Record or update one day's entry.
///
/// Starts from the entry already saved for the date (or the defaults) and
/// changes only the fields given.
#[derive(Debug, Default, Args)]
pub struct LogCommand {
    /// Day to record (defaults to today)
    #[arg(short, long, value_parser = date_arg)]
    pub date: Option<NaiveDate>,

    /// Bowel movements (0-3, 3 means "3 or more")
    #[arg(long)]
    pub bm: Option<u8>,

    /// How easy it was
    #[arg(long)]
    pub ease: Option<Ease>,

    /// Felt incomplete emptying
    #[arg(long, value_name = "BOOL")]
    pub incomplete: Option<bool>,

    /// Bristol stool type (1-7)
    #[arg(long, conflicts_with = "clear_bristol")]
    pub bristol: Option<u8>,

    /// Remove the recorded Bristol type
    #[arg(long)]
    pub clear_bristol: bool,

    /// Morning bloating (0-10)
    #[arg(long, conflicts_with = "clear_bloating_am")]
    pub bloating_am: Option<u8>,

    /// Remove the recorded morning bloating
    #[arg(long)]
    pub clear_bloating_am: bool,

    /// Evening bloating (0-10)
    #[arg(long)]
    pub bloating_pm: Option<u8>,

    /// Gas severity (0-3)
    #[arg(long)]
    pub gas: Option<u8>,

    /// Gas smell
    #[arg(long)]
    pub gas_smell: Option<GasSmell>,

    /// Gas during the night
    #[arg(long, value_name = "BOOL")]
    pub night_gas: Option<bool>,

    /// Ate garlic or onion
    #[arg(long, value_name = "BOOL")]
    pub garlic_onion: Option<bool>,

    /// Ate a high-fat meal
    #[arg(long, value_name = "BOOL")]
    pub high_fat: Option<bool>,

    /// Ate a lot of bread or wheat
    #[arg(long, value_name = "BOOL")]
    pub high_bread_wheat: Option<bool>,

    /// Alcohol (0 none, 1 one or two drinks, 2 three or more)
    #[arg(long)]
    pub alcohol: Option<u8>,

    /// Ate spicy food
    #[arg(long, value_name = "BOOL")]
    pub spicy: Option<bool>,

    /// Took ADHD medication
    #[arg(long, value_name = "BOOL")]
    pub adhd_meds: Option<bool>,

    /// Caffeinated drinks (0-3, 3 means "3 or more")
    #[arg(long)]
    pub caffeine: Option<u8>,

    /// Laxatives taken; replaces any recorded (comma separated)
    #[arg(long, value_delimiter = ',', conflicts_with = "no_laxatives")]
    pub laxatives: Option<Vec<Laxative>>,

    /// Record that no laxatives were taken
    #[arg(long)]
    pub no_laxatives: bool,

    /// Dosing note (max 80 characters)
    #[arg(long)]
    pub dose_note: Option<String>,

    /// Mood (1-5)
    #[arg(long)]
    pub mood: Option<u8>,

    /// Felt physically gross
    #[arg(long, value_name = "BOOL")]
    pub gross_body: Option<bool>,

    /// Period flow
    #[arg(long)]
    pub period: Option<PeriodStatus>,

    /// Cycle symptoms; replaces any recorded (comma separated)
    #[arg(long, value_delimiter = ',', conflicts_with = "no_period_symptoms")]
    pub period_symptoms: Option<Vec<PeriodSymptom>>,

    /// Record that there were no cycle symptoms
    #[arg(long)]
    pub no_period_symptoms: bool,

    /// Free-text note (max 160 characters)
    #[arg(short, long)]
    pub note: Option<String>,
}

impl LogCommand {
    /// Apply the given fields to `entry`, leaving the rest as they are.
    pub fn apply(&self, entry: &mut Entry) {
        fn set<T: Clone>(field: &mut T, value: Option<&T>) {
            if let Some(v) = value {
                field.clone_from(v);
            }
        }

        set(&mut entry.bm_count, self.bm.as_ref());
        set(&mut entry.ease, self.ease.as_ref());
        set(&mut entry.incomplete_emptying, self.incomplete.as_ref());
        set(&mut entry.bloating_pm, self.bloating_pm.as_ref());
        set(&mut entry.gas_severity, self.gas.as_ref());
        set(&mut entry.gas_smell, self.gas_smell.as_ref());
        set(&mut entry.night_gas, self.night_gas.as_ref());
        set(&mut entry.garlic_onion, self.garlic_onion.as_ref());
        set(&mut entry.high_fat, self.high_fat.as_ref());
        set(&mut entry.high_bread_wheat, self.high_bread_wheat.as_ref());
        set(&mut entry.alcohol, self.alcohol.as_ref());
        set(&mut entry.spicy, self.spicy.as_ref());
        set(&mut entry.adhd_meds, self.adhd_meds.as_ref());
        set(&mut entry.caffeine, self.caffeine.as_ref());
        set(&mut entry.dose_note, self.dose_note.as_ref());
        set(&mut entry.mood, self.mood.as_ref());
        set(&mut entry.gross_body, self.gross_body.as_ref());
        set(&mut entry.period_status, self.period.as_ref());
        set(&mut entry.quick_note, self.note.as_ref());

        if self.clear_bristol {
            entry.bristol = None;
        } else if self.bristol.is_some() {
            entry.bristol = self.bristol;
        }

        if self.clear_bloating_am {
            entry.bloating_am = None;
        } else if self.bloating_am.is_some() {
            entry.bloating_am = self.bloating_am;
        }

        if self.no_laxatives {
            entry.laxatives.clear();
        } else if let Some(laxatives) = &self.laxatives {
            entry.laxatives = laxatives.iter().copied().collect();
        }

        if self.no_period_symptoms {
            entry.period_symptoms.clear();
        } else if let Some(symptoms) = &self.period_symptoms {
            entry.period_symptoms = symptoms.iter().copied().collect();
        }
    }
}

/// Copy the latest earlier entry onto a day.
#[derive(Debug, Args)]
pub struct CopyPreviousCommand {
    /// Day to fill in (defaults to today)
    #[arg(short, long, value_parser = date_arg)]
    pub date: Option<NaiveDate>,
}

/// Show a summary of the stored journal.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Show one day's entry.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Day to show (defaults to today)
    #[arg(short, long, value_parser = date_arg)]
    pub date: Option<NaiveDate>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// List recorded days, newest first.
#[derive(Debug, Args)]
pub struct HistoryCommand {
    /// Only show matching days
    #[arg(short, long, value_enum, default_value = "all")]
    pub filter: HistoryFilterArg,

    /// Maximum number of days
    #[arg(short, long, default_value = "30")]
    pub limit: usize,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Compare the current window with the one before it.
#[derive(Debug, Args)]
pub struct TrendsCommand {
    /// Window length in days: 7, 14 or 30 (defaults to the configured window)
    #[arg(short, long)]
    pub window: Option<u32>,

    /// Reference date (defaults to today)
    #[arg(long, value_parser = date_arg)]
    pub today: Option<NaiveDate>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Write a backup or spreadsheet export.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Export format
    #[arg(value_enum)]
    pub format: ExportFormatArg,

    /// Output directory (defaults to the configured directory)
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

/// Import a JSON backup.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// Backup file to import
    pub file: PathBuf,

    /// How to combine the backup with the current journal
    #[arg(short, long, value_enum, default_value = "merge")]
    pub mode: ImportModeArg,
}

/// Delete every entry and setting.
#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Confirm deletion
    #[arg(long)]
    pub yes: bool,
}

/// Display settings commands.
#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Show current settings
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Change settings
    Set {
        /// Ask for morning bloating
        #[arg(long, value_name = "BOOL")]
        track_am_bloating: Option<bool>,

        /// Ask for gas smell
        #[arg(long, value_name = "BOOL")]
        track_gas_smell: Option<bool>,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// History filter argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HistoryFilterArg {
    /// Every recorded day
    All,
    /// Days that felt blocked
    Blocked,
    /// Days with an enema
    Enema,
    /// Days with no bowel movement
    NoBm,
    /// Days with garlic/onion, high fat, high bread or alcohol
    Triggers,
}

impl From<HistoryFilterArg> for HistoryFilter {
    fn from(arg: HistoryFilterArg) -> Self {
        match arg {
            HistoryFilterArg::All => Self::All,
            HistoryFilterArg::Blocked => Self::Blocked,
            HistoryFilterArg::Enema => Self::Enema,
            HistoryFilterArg::NoBm => Self::NoBm,
            HistoryFilterArg::Triggers => Self::Triggers,
        }
    }
}

/// Export format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormatArg {
    /// Full JSON backup, re-importable
    Json,
    /// Spreadsheet-friendly CSV
    Csv,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Json => Self::Json,
            ExportFormatArg::Csv => Self::Csv,
        }
    }
}

/// Import mode argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportModeArg {
    /// Discard the current journal
    Replace,
    /// Keep current entries; the backup wins on shared dates
    Merge,
}

impl From<ImportModeArg> for ImportMode {
    fn from(arg: ImportModeArg) -> Self {
        match arg {
            ImportModeArg::Replace => Self::Replace,
            ImportModeArg::Merge => Self::Merge,
        }
    }
}
