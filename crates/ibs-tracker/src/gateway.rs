//! Persistence gateway: moves the whole [`AppData`] aggregate in and out of
//! a [`KeyValueStore`].
//!
//! Reads are forgiving and writes are strict. A missing or corrupt blob loads
//! as the default aggregate, while any failure to write is surfaced as
//! [`Error::StorageWrite`] or [`Error::QuotaExceeded`].

use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::data::AppData;
use crate::error::{Error, Result};
use crate::storage::KeyValueStore;

/// How an imported aggregate is combined with the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// The imported aggregate becomes the whole state.
    Replace,
    /// Imported entries overlay current ones; imported wins per date.
    #[default]
    Merge,
}

impl std::fmt::Display for ImportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replace => write!(f, "replace"),
            Self::Merge => write!(f, "merge"),
        }
    }
}

/// Reads and writes the journal blob under one store key.
#[derive(Debug)]
pub struct Gateway<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> Gateway<S> {
    /// Create a gateway persisting under `key`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// The store key in use.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the persisted aggregate.
    ///
    /// Never fails: an absent, unreadable or malformed blob yields
    /// [`AppData::default`].
    #[must_use]
    pub fn load(&self) -> AppData {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "No stored journal, starting empty");
                return AppData::default();
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read stored journal, starting empty");
                return AppData::default();
            }
        };

        match AppData::from_json(&raw) {
            Ok(data) => {
                debug!(key = %self.key, entries = data.len(), "Loaded journal");
                data
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Stored journal is corrupt, starting empty");
                AppData::default()
            }
        }
    }

    /// Persist the aggregate, stamping `lastSavedAt` with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`] or [`Error::QuotaExceeded`] if the blob
    /// could not be written. `data` is left unchanged on failure.
    pub fn save(&self, data: &mut AppData) -> Result<()> {
        self.save_at(data, Utc::now())
    }

    /// Persist the aggregate, stamping `lastSavedAt` with `now`.
    ///
    /// # Errors
    ///
    /// See [`Gateway::save`].
    pub fn save_at(&self, data: &mut AppData, now: DateTime<Utc>) -> Result<()> {
        let previous = data.last_saved_at.replace(now);

        let result = serde_json::to_string(data)
            .map_err(Error::from)
            .and_then(|json| self.store.put(&self.key, &json))
            .map_err(|e| self.write_error(e));

        match result {
            Ok(()) => {
                info!(key = %self.key, entries = data.len(), "Saved journal");
                Ok(())
            }
            Err(e) => {
                data.last_saved_at = previous;
                Err(e)
            }
        }
    }

    /// Delete the persisted aggregate.
    ///
    /// Returns `true` if there was anything to delete.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`] if the store could not be written.
    pub fn clear(&self) -> Result<bool> {
        let removed = self
            .store
            .remove(&self.key)
            .map_err(|e| self.write_error(e))?;
        info!(key = %self.key, removed, "Cleared journal");
        Ok(removed)
    }

    fn write_error(&self, err: Error) -> Error {
        if err.is_write_error() {
            err
        } else {
            Error::storage_write(&self.key, err.to_string())
        }
    }
}

/// Decode and validate an import document.
///
/// Imports are stricter than loads: the document must carry an `entries`
/// object, and the entry sets must not repeat a value. `source_name` is only
/// used in error messages.
///
/// # Errors
///
/// Returns [`Error::ImportParse`] if the input is not an aggregate or any
/// entry in it is invalid.
pub fn parse_import(input: &str, source_name: &str) -> Result<AppData> {
    let reject = |message: String| Error::import_parse(source_name, message);

    let value: Value = serde_json::from_str(input).map_err(|e| reject(e.to_string()))?;
    match value.get("entries") {
        Some(Value::Object(entries)) => {
            if let Some(message) = repeated_set_value(entries) {
                return Err(reject(message));
            }
        }
        Some(_) => return Err(reject("\"entries\" is not an object".to_string())),
        None => return Err(reject("missing \"entries\" object".to_string())),
    }

    let data = AppData::from_value(value).map_err(|e| reject(e.to_string()))?;
    data.validate().map_err(|e| reject(e.to_string()))?;
    Ok(data)
}

/// Find the first entry whose `laxatives` or `periodSymptoms` list repeats a
/// value.
fn repeated_set_value(entries: &serde_json::Map<String, Value>) -> Option<String> {
    for (date, entry) in entries {
        for field in ["laxatives", "periodSymptoms"] {
            let Some(items) = entry.get(field).and_then(Value::as_array) else {
                continue;
            };
            for (i, item) in items.iter().enumerate() {
                if items[..i].contains(item) {
                    return Some(format!("entry {date}: {field} lists {item} more than once"));
                }
            }
        }
    }
    None
}

/// Read and validate an import file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, or
/// [`Error::ImportParse`] if its contents are rejected.
pub fn read_import(path: &Path) -> Result<AppData> {
    let input = std::fs::read_to_string(path)?;
    let data = parse_import(&input, &path.display().to_string())?;
    debug!(path = %path.display(), entries = data.len(), "Read import file");
    Ok(data)
}

/// Combine an imported aggregate with the current one.
///
/// In [`ImportMode::Merge`] the imported version, settings and `lastSavedAt`
/// replace the current ones; entries are overlaid per date.
#[must_use]
pub fn apply_import(current: &AppData, imported: AppData, mode: ImportMode) -> AppData {
    match mode {
        ImportMode::Replace => imported,
        ImportMode::Merge => {
            let mut entries = current.entries.clone();
            entries.extend(imported.entries);
            AppData {
                version: imported.version,
                settings: imported.settings,
                entries,
                last_saved_at: imported.last_saved_at,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{parse_date, Entry};
    use crate::storage::Storage;
    use chrono::{NaiveDate, TimeZone};

    const KEY: &str = "ibs-tracker-data";

    fn day(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn gateway() -> Gateway<Storage> {
        Gateway::new(Storage::open_in_memory().unwrap(), KEY)
    }

    fn sample() -> AppData {
        let mut data = AppData::default();
        let mut entry = Entry::new(day("2024-01-01"));
        entry.bloating_pm = 8;
        entry.quick_note = "rough day".to_string();
        data.upsert(entry);
        data.upsert(Entry::new(day("2024-01-02")));
        data
    }

    /// A store whose writes always fail.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::Io(std::io::Error::other("disk gone")))
        }

        fn put(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Io(std::io::Error::other("disk full")))
        }

        fn remove(&self, _key: &str) -> Result<bool> {
            Err(Error::Io(std::io::Error::other("read-only")))
        }
    }

    #[test]
    fn test_load_absent_is_default() {
        assert_eq!(gateway().load(), AppData::default());
    }

    #[test]
    fn test_load_corrupt_is_default() {
        crate::logging::init_test_logging();
        let gw = gateway();
        gw.store().put(KEY, "{not json").unwrap();
        assert_eq!(gw.load(), AppData::default());
    }

    #[test]
    fn test_load_read_failure_is_default() {
        let gw = Gateway::new(BrokenStore, KEY);
        assert_eq!(gw.load(), AppData::default());
    }

    #[test]
    fn test_load_applies_root_defaults() {
        let gw = gateway();
        gw.store()
            .put(KEY, r#"{"settings":{"trackAMBloating":true}}"#)
            .unwrap();

        let data = gw.load();
        assert_eq!(data.version, 1);
        assert!(data.settings.track_am_bloating);
        assert!(data.settings.track_gas_smell);
        assert!(data.is_empty());
        assert!(data.last_saved_at.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let gw = gateway();
        let mut data = sample();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 20, 30, 0).unwrap();

        gw.save_at(&mut data, now).unwrap();
        assert_eq!(data.last_saved_at, Some(now));

        let loaded = gw.load();
        assert_eq!(loaded, data);
    }

    #[test]
    fn test_save_writes_rfc3339_timestamp() {
        let gw = gateway();
        let mut data = AppData::default();
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 5, 6, 7).unwrap();
        gw.save_at(&mut data, now).unwrap();

        let raw = gw.store().get(KEY).unwrap().unwrap();
        assert!(raw.contains("\"lastSavedAt\":\"2024-03-04T05:06:07Z\""));
    }

    #[test]
    fn test_save_failure_is_write_error() {
        let gw = Gateway::new(BrokenStore, KEY);
        let mut data = sample();

        let err = gw.save(&mut data).unwrap_err();
        assert!(err.is_write_error());
        assert!(matches!(err, Error::StorageWrite { ref key, .. } if key == KEY));
        assert!(data.last_saved_at.is_none());
    }

    #[test]
    fn test_save_quota_passes_through() {
        let gw = Gateway::new(Storage::open_in_memory().unwrap().with_quota(16), KEY);
        let mut data = sample();

        let err = gw.save(&mut data).unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded { limit: 16, .. }));
        assert!(gw.store().get(KEY).unwrap().is_none());
    }

    #[test]
    fn test_clear() {
        let gw = gateway();
        let mut data = sample();
        gw.save(&mut data).unwrap();

        assert!(gw.clear().unwrap());
        assert_eq!(gw.load(), AppData::default());
        assert!(!gw.clear().unwrap());
    }

    #[test]
    fn test_clear_failure_is_write_error() {
        let gw = Gateway::new(BrokenStore, KEY);
        assert!(gw.clear().unwrap_err().is_write_error());
    }

    #[test]
    fn test_parse_import_rejects_malformed() {
        let err = parse_import("[1,2,3]", "backup.json").unwrap_err();
        assert!(err.is_import_error());
        assert!(err.to_string().contains("backup.json"));
    }

    #[test]
    fn test_parse_import_rejects_invalid_entry() {
        let mut entry = serde_json::to_value(Entry::new(day("2024-01-01"))).unwrap();
        entry["bloatingPM"] = 11.into();
        let json = serde_json::json!({
            "version": 1,
            "entries": { "2024-01-01": entry }
        })
        .to_string();

        let err = parse_import(&json, "bad.json").unwrap_err();
        assert!(err.is_import_error());
        assert!(err.to_string().contains("bloatingPM"));
    }

    #[test]
    fn test_parse_import_rejects_mismatched_key() {
        let entry = serde_json::to_value(Entry::new(day("2024-01-05"))).unwrap();
        let json = serde_json::json!({ "entries": { "2024-01-01": entry } }).to_string();

        let err = parse_import(&json, "x").unwrap_err();
        assert!(err.is_import_error());
        assert!(err.to_string().contains("2024-01-05"));
    }

    #[test]
    fn test_parse_import_requires_entries() {
        let err = parse_import(r#"{"name":"my-app","dependencies":{}}"#, "package.json")
            .unwrap_err();
        assert!(err.is_import_error());
        assert!(err.to_string().contains("entries"));

        let err = parse_import(r#"{"version":1,"entries":null}"#, "backup.json").unwrap_err();
        assert!(err.is_import_error());
    }

    #[test]
    fn test_parse_import_accepts_empty_entries() {
        let data = parse_import(r#"{"entries":{}}"#, "backup.json").unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_parse_import_rejects_repeated_laxative() {
        let mut entry = serde_json::to_value(Entry::new(day("2024-01-01"))).unwrap();
        entry["laxatives"] = serde_json::json!(["enema", "enema"]);
        let json = serde_json::json!({ "entries": { "2024-01-01": entry } }).to_string();

        let err = parse_import(&json, "backup.json").unwrap_err();
        assert!(err.is_import_error());
        assert!(err.to_string().contains("laxatives"));
    }

    #[test]
    fn test_load_keeps_entries_when_settings_null() {
        let gw = gateway();
        let entry = serde_json::to_value(Entry::new(day("2024-01-01"))).unwrap();
        let blob = serde_json::json!({
            "version": null,
            "settings": null,
            "entries": { "2024-01-01": entry }
        })
        .to_string();
        gw.store().put(KEY, &blob).unwrap();

        let data = gw.load();
        assert_eq!(data.len(), 1);
        assert_eq!(data.version, 1);
        assert_eq!(data.settings, crate::data::Settings::default());
    }

    #[test]
    fn test_default_import_mode_is_merge() {
        assert_eq!(ImportMode::default(), ImportMode::Merge);
    }

    #[test]
    fn test_replace_discards_current() {
        let current = sample();
        let mut imported = AppData::default();
        imported.upsert(Entry::new(day("2023-06-01")));

        let result = apply_import(&current, imported.clone(), ImportMode::Replace);
        assert_eq!(result, imported);
    }

    #[test]
    fn test_merge_overlays_and_takes_imported_settings() {
        let current = sample();
        let mut imported = AppData::default();
        imported.settings.track_gas_smell = false;
        let mut overlay = Entry::new(day("2024-01-01"));
        overlay.bloating_pm = 1;
        imported.upsert(overlay);
        imported.upsert(Entry::new(day("2024-01-03")));

        let merged = apply_import(&current, imported, ImportMode::Merge);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.entry(day("2024-01-01")).unwrap().bloating_pm, 1);
        assert_eq!(
            merged.entry(day("2024-01-02")),
            current.entry(day("2024-01-02"))
        );
        assert!(!merged.settings.track_gas_smell);
    }

    #[test]
    fn test_read_import_missing_file() {
        let err = read_import(Path::new("/nonexistent/backup.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
