//! The live journal: the in-memory aggregate paired with its gateway.
//!
//! A [`Journal`] is created once by the caller and passed by reference to
//! every operation. Each mutation is persisted before it becomes visible; if
//! the write fails the in-memory state is left as it was.

use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::Config;
use crate::data::{AppData, Settings};
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::gateway::{self, Gateway, ImportMode};
use crate::storage::{KeyValueStore, Storage};
use crate::trends::{TrendReport, Window};

/// The journal state and the gateway it is persisted through.
#[derive(Debug)]
pub struct Journal<S> {
    data: AppData,
    gateway: Gateway<S>,
}

impl Journal<Storage> {
    /// Open the configured database and load the journal from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened. A corrupt or
    /// missing journal blob is not an error.
    pub fn open(config: &Config) -> Result<Self> {
        let storage =
            Storage::open(config.database_path())?.with_quota(config.storage.max_blob_bytes);
        Ok(Self::load(Gateway::new(
            storage,
            config.storage.storage_key.as_str(),
        )))
    }
}

impl<S: KeyValueStore> Journal<S> {
    /// Load the journal through `gateway`.
    #[must_use]
    pub fn load(gateway: Gateway<S>) -> Self {
        let data = gateway.load();
        Self { data, gateway }
    }

    /// The current aggregate.
    #[must_use]
    pub fn data(&self) -> &AppData {
        &self.data
    }

    /// The gateway this journal persists through.
    #[must_use]
    pub fn gateway(&self) -> &Gateway<S> {
        &self.gateway
    }

    /// The recorded entry for `date`, if any.
    #[must_use]
    pub fn entry(&self, date: NaiveDate) -> Option<&Entry> {
        self.data.entry(date)
    }

    /// The recorded entry for `date`, or the default one.
    #[must_use]
    pub fn entry_or_default(&self, date: NaiveDate) -> Entry {
        self.data.entry_or_default(date)
    }

    /// Validate and store an entry, replacing any entry for the same date.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEntry`] if the entry is out of range, or a
    /// write error if it could not be persisted.
    pub fn save_entry(&mut self, entry: Entry) -> Result<()> {
        entry.validate()?;
        let date = entry.date;
        let replaced = self.data.upsert(entry);

        if let Err(e) = self.gateway.save(&mut self.data) {
            match replaced {
                Some(old) => {
                    self.data.upsert(old);
                }
                None => {
                    self.data.remove(date);
                }
            }
            return Err(e);
        }

        debug!(%date, replaced = replaced.is_some(), "Saved entry");
        Ok(())
    }

    /// Copy the latest entry dated before `date` onto `date` and save it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPreviousEntry`] if nothing earlier is recorded, or a
    /// write error if saving fails.
    pub fn copy_previous(&mut self, date: NaiveDate) -> Result<Entry> {
        let copied = self
            .data
            .previous_entry(date)
            .map(|e| e.with_date(date))
            .ok_or_else(|| Error::NoPreviousEntry {
                date: date.to_string(),
            })?;

        self.save_entry(copied.clone())?;
        Ok(copied)
    }

    /// Replace the display settings.
    ///
    /// # Errors
    ///
    /// Returns a write error if the journal could not be persisted.
    pub fn update_settings(&mut self, settings: Settings) -> Result<()> {
        let previous = std::mem::replace(&mut self.data.settings, settings);
        if let Err(e) = self.gateway.save(&mut self.data) {
            self.data.settings = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Combine `imported` with the journal and persist the result.
    ///
    /// # Errors
    ///
    /// Returns a write error if the result could not be persisted; the
    /// journal is unchanged in that case.
    pub fn apply_import(&mut self, imported: AppData, mode: ImportMode) -> Result<()> {
        let mut next = gateway::apply_import(&self.data, imported, mode);
        self.gateway.save(&mut next)?;

        info!(%mode, entries = next.len(), "Imported journal");
        self.data = next;
        Ok(())
    }

    /// Read an import file and apply it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] or [`Error::ImportParse`] if the file is
    /// unreadable or rejected, or a write error if persisting fails. The
    /// journal is unchanged on any error.
    pub fn import_file(&mut self, path: &Path, mode: ImportMode) -> Result<()> {
        let imported = gateway::read_import(path)?;
        self.apply_import(imported, mode)
    }

    /// Delete everything, in the store and in memory.
    ///
    /// # Errors
    ///
    /// Returns a write error if the store could not be cleared.
    pub fn clear(&mut self) -> Result<()> {
        self.gateway.clear()?;
        self.data = AppData::default();
        Ok(())
    }

    /// Trend report for `window` as of `today`.
    #[must_use]
    pub fn report(&self, window: Window, today: NaiveDate) -> TrendReport {
        TrendReport::build(&self.data.entries, window, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::parse_date;
    use std::cell::Cell;

    fn day(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn journal() -> Journal<Storage> {
        Journal::load(Gateway::new(
            Storage::open_in_memory().unwrap(),
            "ibs-tracker-data",
        ))
    }

    /// Accepts a fixed number of writes, then fails.
    struct FlakyStore {
        inner: Storage,
        writes_left: Cell<u32>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: &str) -> Result<()> {
            if self.writes_left.get() == 0 {
                return Err(Error::Io(std::io::Error::other("disk full")));
            }
            self.writes_left.set(self.writes_left.get() - 1);
            self.inner.put(key, value)
        }

        fn remove(&self, key: &str) -> Result<bool> {
            self.inner.remove(key)
        }
    }

    fn flaky_journal(writes: u32) -> Journal<FlakyStore> {
        let store = FlakyStore {
            inner: Storage::open_in_memory().unwrap(),
            writes_left: Cell::new(writes),
        };
        Journal::load(Gateway::new(store, "ibs-tracker-data"))
    }

    #[test]
    fn test_save_entry_persists() {
        let mut journal = journal();
        let mut entry = Entry::new(day("2024-01-01"));
        entry.bm_count = 2;
        journal.save_entry(entry.clone()).unwrap();

        assert_eq!(journal.entry(day("2024-01-01")), Some(&entry));
        assert!(journal.data().last_saved_at.is_some());
        assert_eq!(journal.gateway().load(), *journal.data());
    }

    #[test]
    fn test_save_entry_overwrites() {
        let mut journal = journal();
        journal.save_entry(Entry::new(day("2024-01-01"))).unwrap();
        let mut second = Entry::new(day("2024-01-01"));
        second.mood = 5;
        journal.save_entry(second).unwrap();

        assert_eq!(journal.data().len(), 1);
        assert_eq!(journal.entry(day("2024-01-01")).unwrap().mood, 5);
    }

    #[test]
    fn test_save_entry_rejects_invalid() {
        let mut journal = journal();
        let mut entry = Entry::new(day("2024-01-01"));
        entry.mood = 0;

        let err = journal.save_entry(entry).unwrap_err();
        assert!(matches!(err, Error::InvalidEntry { field: "mood", .. }));
        assert!(journal.data().is_empty());
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let mut journal = flaky_journal(1);
        let mut first = Entry::new(day("2024-01-01"));
        first.bm_count = 1;
        journal.save_entry(first.clone()).unwrap();

        let mut replacement = first.clone();
        replacement.bm_count = 3;
        assert!(journal.save_entry(replacement).unwrap_err().is_write_error());
        assert!(journal
            .save_entry(Entry::new(day("2024-01-02")))
            .unwrap_err()
            .is_write_error());

        assert_eq!(journal.data().len(), 1);
        assert_eq!(journal.entry(day("2024-01-01")), Some(&first));
    }

    #[test]
    fn test_copy_previous() {
        let mut journal = journal();
        let mut source = Entry::new(day("2024-01-01"));
        source.quick_note = "same as always".to_string();
        journal.save_entry(source).unwrap();

        let copied = journal.copy_previous(day("2024-01-05")).unwrap();
        assert_eq!(copied.date, day("2024-01-05"));
        assert_eq!(copied.quick_note, "same as always");
        assert_eq!(journal.entry(day("2024-01-05")), Some(&copied));
    }

    #[test]
    fn test_copy_previous_without_history() {
        let mut journal = journal();
        journal.save_entry(Entry::new(day("2024-01-05"))).unwrap();

        let err = journal.copy_previous(day("2024-01-05")).unwrap_err();
        assert!(matches!(err, Error::NoPreviousEntry { .. }));
    }

    #[test]
    fn test_update_settings() {
        let mut journal = journal();
        let settings = Settings {
            track_am_bloating: true,
            track_gas_smell: false,
        };
        journal.update_settings(settings).unwrap();

        assert_eq!(journal.data().settings, settings);
        assert_eq!(journal.gateway().load().settings, settings);
    }

    #[test]
    fn test_update_settings_failure_keeps_old() {
        let mut journal = flaky_journal(0);
        let err = journal
            .update_settings(Settings {
                track_am_bloating: true,
                track_gas_smell: true,
            })
            .unwrap_err();
        assert!(err.is_write_error());
        assert_eq!(journal.data().settings, Settings::default());
    }

    #[test]
    fn test_import_failure_leaves_state() {
        let mut journal = flaky_journal(1);
        journal.save_entry(Entry::new(day("2024-01-01"))).unwrap();
        let before = journal.data().clone();

        let mut imported = AppData::default();
        imported.upsert(Entry::new(day("2023-01-01")));
        assert!(journal
            .apply_import(imported, ImportMode::Replace)
            .is_err());
        assert_eq!(*journal.data(), before);
    }

    #[test]
    fn test_import_file_rejected_leaves_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"entries\": 5}").unwrap();

        let mut journal = journal();
        journal.save_entry(Entry::new(day("2024-01-01"))).unwrap();
        let before = journal.data().clone();

        let err = journal.import_file(&path, ImportMode::Merge).unwrap_err();
        assert!(err.is_import_error());
        assert_eq!(*journal.data(), before);
    }

    #[test]
    fn test_clear() {
        let mut journal = journal();
        journal.save_entry(Entry::new(day("2024-01-01"))).unwrap();
        journal.clear().unwrap();

        assert_eq!(*journal.data(), AppData::default());
        assert_eq!(journal.gateway().load(), AppData::default());
    }

    #[test]
    fn test_reopen_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.database_path = Some(dir.path().join("journal.db"));

        let mut journal = Journal::open(&config).unwrap();
        journal.save_entry(Entry::new(day("2024-01-01"))).unwrap();
        drop(journal);

        let reopened = Journal::open(&config).unwrap();
        assert_eq!(reopened.data().len(), 1);
    }

    #[test]
    fn test_report() {
        let mut journal = journal();
        let mut entry = Entry::new(day("2024-01-02"));
        entry.bloating_pm = 5;
        journal.save_entry(entry).unwrap();

        let report = journal.report(Window::Week, day("2024-01-02"));
        assert_eq!(report.current.days_recorded, 1);
        assert!((report.current.avg_bloating_pm - 5.0).abs() < f64::EPSILON);
    }
}
