//! History listing: filtered, newest-first views over the journal.

use chrono::NaiveDate;

use crate::data::Entries;
use crate::entry::{Ease, Entry};

/// Which days to include in a history listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryFilter {
    /// Every recorded day.
    #[default]
    All,
    /// Days that felt blocked.
    Blocked,
    /// Days with an enema.
    Enema,
    /// Days with no bowel movement.
    NoBm,
    /// Days with any dietary trigger.
    Triggers,
}

impl HistoryFilter {
    /// Whether `entry` passes this filter.
    #[must_use]
    pub fn matches(self, entry: &Entry) -> bool {
        match self {
            Self::All => true,
            Self::Blocked => entry.ease == Ease::Blocked,
            Self::Enema => entry.used_enema(),
            Self::NoBm => entry.bm_count == 0,
            Self::Triggers => entry.has_trigger(),
        }
    }
}

/// Dates passing `filter`, newest first, at most `limit` of them.
#[must_use]
pub fn filter_dates(entries: &Entries, filter: HistoryFilter, limit: usize) -> Vec<NaiveDate> {
    entries
        .iter()
        .rev()
        .filter(|(_, e)| filter.matches(e))
        .map(|(date, _)| *date)
        .take(limit)
        .collect()
}

/// Coarse severity band for evening bloating, used to shade history rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BloatingBand {
    /// 0–2.
    Low,
    /// 3–4.
    Mild,
    /// 5–6.
    Moderate,
    /// 7 and above.
    Severe,
}

impl BloatingBand {
    /// Band for a bloating level.
    #[must_use]
    pub fn for_level(level: u8) -> Self {
        match level {
            0..=2 => Self::Low,
            3..=4 => Self::Mild,
            5..=6 => Self::Moderate,
            _ => Self::Severe,
        }
    }

    /// Lowercase label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}
