//! The persisted application aggregate.
//!
//! [`AppData`] is the whole journal as it is stored, exported and imported:
//! a format version, the user's display settings, every entry keyed by date,
//! and the time of the last successful save.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::entry::Entry;
use crate::error::{Error, Result};

/// Current version tag written into the persisted aggregate.
pub const CURRENT_VERSION: u32 = 1;

/// Which optional fields the entry form surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Ask for morning bloating.
    #[serde(rename = "trackAMBloating")]
    pub track_am_bloating: bool,
    /// Ask for gas smell.
    #[serde(rename = "trackGasSmell")]
    pub track_gas_smell: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            track_am_bloating: false,
            track_gas_smell: true,
        }
    }
}

/// Entries keyed by calendar date, iterated in ascending date order.
pub type Entries = BTreeMap<NaiveDate, Entry>;

/// The root persisted aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppData {
    /// Format version.
    #[serde(default = "current_version", deserialize_with = "null_as_default")]
    pub version: u32,
    /// Display settings.
    #[serde(default, deserialize_with = "null_as_default")]
    pub settings: Settings,
    /// All recorded entries.
    #[serde(default, deserialize_with = "null_as_default")]
    pub entries: Entries,
    /// When the journal was last written to the store.
    #[serde(default)]
    pub last_saved_at: Option<DateTime<Utc>>,
}

fn current_version() -> u32 {
    CURRENT_VERSION
}

/// An explicit `null` decodes the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for AppData {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            settings: Settings::default(),
            entries: Entries::new(),
            last_saved_at: None,
        }
    }
}

impl AppData {
    /// Decode an aggregate from JSON, applying defaults for missing or null
    /// root fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the input is not a valid aggregate.
    pub fn from_json(input: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(input)?)
    }

    /// Decode an aggregate from an already parsed JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the document is not a valid aggregate.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let mut data: Self = serde_json::from_value(value)?;
        if data.version == 0 {
            data.version = CURRENT_VERSION;
        }
        Ok(data)
    }

    /// Validate every entry and check each is stored under its own date.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEntry`] for the first inconsistent entry.
    pub fn validate(&self) -> Result<()> {
        for (date, entry) in &self.entries {
            if entry.date != *date {
                return Err(Error::invalid_entry(
                    "date",
                    format!("entry stored under {date} is dated {}", entry.date),
                ));
            }
            entry.validate()?;
        }
        Ok(())
    }

    /// Get the entry for a date.
    #[must_use]
    pub fn entry(&self, date: NaiveDate) -> Option<&Entry> {
        self.entries.get(&date)
    }

    /// Get the entry for a date, or a fresh default one.
    #[must_use]
    pub fn entry_or_default(&self, date: NaiveDate) -> Entry {
        self.entries
            .get(&date)
            .cloned()
            .unwrap_or_else(|| Entry::new(date))
    }

    /// Insert or replace the entry for its date.
    ///
    /// Returns the entry that was replaced, if any.
    pub fn upsert(&mut self, entry: Entry) -> Option<Entry> {
        self.entries.insert(entry.date, entry)
    }

    /// Remove the entry for a date.
    pub fn remove(&mut self, date: NaiveDate) -> Option<Entry> {
        self.entries.remove(&date)
    }

    /// The most recent entry dated strictly before `date`.
    #[must_use]
    pub fn previous_entry(&self, date: NaiveDate) -> Option<&Entry> {
        self.entries.range(..date).next_back().map(|(_, e)| e)
    }

    /// Number of recorded days.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First and last recorded dates.
    #[must_use]
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.entries.keys().next()?;
        let last = self.entries.keys().next_back()?;
        Some((*first, *last))
    }
}
