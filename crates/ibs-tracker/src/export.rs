//! Backup and spreadsheet export.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::data::AppData;
use crate::entry::{Entry, DATE_FORMAT};
use crate::error::{Error, Result};

/// Column order of the CSV export.
pub const CSV_HEADER: [&str; 24] = [
    "date",
    "bmCount",
    "ease",
    "incompleteEmptying",
    "bristol",
    "bloatingAM",
    "bloatingPM",
    "gasSeverity",
    "gasSmell",
    "nightGas",
    "garlicOnion",
    "highFat",
    "highBreadWheat",
    "alcohol",
    "spicy",
    "adhdMeds",
    "caffeine",
    "laxatives",
    "doseNote",
    "mood",
    "grossBody",
    "periodStatus",
    "periodSymptoms",
    "quickNote",
];

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Full-fidelity JSON backup, re-importable.
    Json,
    /// One row per entry, for spreadsheets.
    Csv,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    /// File name for an export taken on `today`.
    #[must_use]
    pub fn file_name(self, app_name: &str, today: NaiveDate) -> String {
        let kind = match self {
            Self::Json => "backup",
            Self::Csv => "export",
        };
        format!(
            "{app_name}-{kind}-{}.{}",
            today.format(DATE_FORMAT),
            self.extension()
        )
    }

    /// Render the journal in this format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if JSON encoding fails.
    pub fn render(self, data: &AppData) -> Result<String> {
        match self {
            Self::Json => to_json(data),
            Self::Csv => Ok(to_csv(data)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Pretty-printed JSON of the whole aggregate.
///
/// # Errors
///
/// Returns [`Error::Json`] if encoding fails.
pub fn to_json(data: &AppData) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// CSV of every entry, ascending by date, rows joined by `\n`.
#[must_use]
pub fn to_csv(data: &AppData) -> String {
    let mut lines = Vec::with_capacity(data.len() + 1);
    lines.push(CSV_HEADER.join(","));
    lines.extend(data.entries.values().map(csv_row));
    lines.join("\n")
}

fn csv_row(e: &Entry) -> String {
    let cells = [
        e.date.format(DATE_FORMAT).to_string(),
        e.bm_count.to_string(),
        e.ease.to_string(),
        e.incomplete_emptying.to_string(),
        optional(e.bristol),
        optional(e.bloating_am),
        e.bloating_pm.to_string(),
        e.gas_severity.to_string(),
        e.gas_smell.to_string(),
        e.night_gas.to_string(),
        e.garlic_onion.to_string(),
        e.high_fat.to_string(),
        e.high_bread_wheat.to_string(),
        e.alcohol.to_string(),
        e.spicy.to_string(),
        e.adhd_meds.to_string(),
        e.caffeine.to_string(),
        join_set(&e.laxatives),
        e.dose_note.clone(),
        e.mood.to_string(),
        e.gross_body.to_string(),
        e.period_status.to_string(),
        join_set(&e.period_symptoms),
        e.quick_note.clone(),
    ];

    cells
        .iter()
        .map(|c| escape_csv(c))
        .collect::<Vec<_>>()
        .join(",")
}

fn optional(value: Option<u8>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn join_set<T: Display>(items: impl IntoIterator<Item = T>) -> String {
    items
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// Quote a cell if it contains a comma, a double quote, or a line break.
#[must_use]
pub fn escape_csv(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write an export file into `dir`, creating it if needed.
///
/// Returns the path written.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, encoding fails, or
/// the file cannot be written.
pub fn write_export(
    data: &AppData,
    format: ExportFormat,
    dir: &Path,
    app_name: &str,
    today: NaiveDate,
) -> Result<PathBuf> {
    if !dir.as_os_str().is_empty() && !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let path = dir.join(format.file_name(app_name, today));
    let contents = format.render(data)?;
    std::fs::write(&path, contents)?;

    info!(path = %path.display(), %format, entries = data.len(), "Exported journal");
    Ok(path)
}
