//! `ibs-tracker` - A local-first daily digestive symptom journal
//!
//! This library holds the journal model, its persistence to a local `SQLite`
//! key-value store, JSON/CSV export and import, and the trend engine that
//! compares recent windows and raises red-flag advisories.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod data;
pub mod entry;
pub mod error;
pub mod export;
pub mod gateway;
pub mod history;
pub mod journal;
pub mod logging;
pub mod storage;
pub mod trends;

pub use config::Config;
pub use data::{AppData, Settings};
pub use entry::{Ease, Entry, GasSmell, Laxative, PeriodStatus, PeriodSymptom};
pub use error::{Error, Result};
pub use gateway::{Gateway, ImportMode};
pub use journal::Journal;
pub use logging::init_logging;
pub use storage::{KeyValueStore, Storage, StorageStats};
pub use trends::{RedFlag, Trend, TrendReport, Window, WindowStats};
