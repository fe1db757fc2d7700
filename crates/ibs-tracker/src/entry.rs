//! Core journal entry types for ibs-tracker.
//!
//! This module defines the per-day record a user fills in, the enumerations
//! its fields draw from, and the range checks every saved or imported entry
//! must pass.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum length of [`Entry::dose_note`], in characters.
pub const DOSE_NOTE_MAX_CHARS: usize = 80;

/// Maximum length of [`Entry::quick_note`], in characters.
pub const QUICK_NOTE_MAX_CHARS: usize = 160;

/// Calendar date format used for keys, file names and CSV rows.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an ISO `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns [`Error::InvalidDate`] if the input is not a valid date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|_| Error::InvalidDate {
        input: input.to_string(),
    })
}

/// How easy the bowel movement was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ease {
    /// No effort needed.
    #[default]
    Easy,
    /// Some effort.
    Effort,
    /// Straining.
    Straining,
    /// Felt blocked.
    Blocked,
}

/// Odour of the day's gas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GasSmell {
    /// Nothing unusual.
    #[default]
    Normal,
    /// Noticeably strong.
    Strong,
}

/// A laxative taken that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Laxative {
    /// Osmotic laxative.
    Macrogol,
    /// Stimulant laxative.
    Stimulant,
    /// Enema.
    Enema,
}

/// Menstrual flow for the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// Not on period.
    #[default]
    None,
    /// Spotting.
    Spotting,
    /// Light flow.
    Light,
    /// Medium flow.
    Medium,
    /// Heavy flow.
    Heavy,
}

/// A cycle-related symptom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PeriodSymptom {
    /// Cramps.
    Cramps,
    /// Breast tenderness.
    BreastTenderness,
    /// Headache.
    Headache,
    /// Low energy.
    LowEnergy,
    /// PMS-related mood changes.
    PmsMood,
    /// Hormonal bloating.
    HormonalBloating,
}

macro_rules! wire_name {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// The serialized name of this value.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    other => Err(format!(
                        "unknown value '{other}' (expected one of: {})",
                        [$($name),+].join(", ")
                    )),
                }
            }
        }
    };
}

wire_name!(Ease {
    Easy => "easy",
    Effort => "effort",
    Straining => "straining",
    Blocked => "blocked",
});

wire_name!(GasSmell {
    Normal => "normal",
    Strong => "strong",
});

wire_name!(Laxative {
    Macrogol => "macrogol",
    Stimulant => "stimulant",
    Enema => "enema",
});

wire_name!(PeriodStatus {
    None => "none",
    Spotting => "spotting",
    Light => "light",
    Medium => "medium",
    Heavy => "heavy",
});

wire_name!(PeriodSymptom {
    Cramps => "cramps",
    BreastTenderness => "breastTenderness",
    Headache => "headache",
    LowEnergy => "lowEnergy",
    PmsMood => "pmsMood",
    HormonalBloating => "hormonalBloating",
});

/// One day's journal record.
///
/// The date is the entry's identity: the journal holds at most one entry per
/// date and saving another replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// The calendar day this entry describes.
    pub date: NaiveDate,
    /// Bowel movements that day; 3 means "3 or more".
    pub bm_count: u8,
    /// How easy the movements were.
    pub ease: Ease,
    /// Felt incomplete emptying.
    pub incomplete_emptying: bool,
    /// Bristol stool scale, 1–7, if recorded.
    pub bristol: Option<u8>,
    /// Morning bloating 0–10, if tracked that day.
    #[serde(rename = "bloatingAM")]
    pub bloating_am: Option<u8>,
    /// Evening bloating 0–10.
    #[serde(rename = "bloatingPM")]
    pub bloating_pm: u8,
    /// Gas severity 0–3.
    pub gas_severity: u8,
    /// Gas odour.
    pub gas_smell: GasSmell,
    /// Gas during the night.
    pub night_gas: bool,
    /// Ate garlic or onion.
    pub garlic_onion: bool,
    /// Ate a high-fat meal.
    pub high_fat: bool,
    /// Ate a lot of bread or wheat.
    pub high_bread_wheat: bool,
    /// Alcohol: 0 none, 1 one or two drinks, 2 three or more.
    pub alcohol: u8,
    /// Ate spicy food.
    pub spicy: bool,
    /// Took ADHD medication.
    pub adhd_meds: bool,
    /// Caffeinated drinks; 3 means "3 or more".
    pub caffeine: u8,
    /// Laxatives taken.
    ///
    /// Decoding collapses repeated values; imports reject them before this
    /// point.
    pub laxatives: BTreeSet<Laxative>,
    /// Free-text dosing note.
    pub dose_note: String,
    /// Mood 1–5.
    pub mood: u8,
    /// Felt physically gross.
    pub gross_body: bool,
    /// Menstrual flow.
    pub period_status: PeriodStatus,
    /// Cycle symptoms. Repeated values are handled as for `laxatives`.
    pub period_symptoms: BTreeSet<PeriodSymptom>,
    /// Free-text note.
    pub quick_note: String,
}

impl Entry {
    /// Create the default entry for a date that has nothing recorded yet.
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            bm_count: 0,
            ease: Ease::Easy,
            incomplete_emptying: false,
            bristol: None,
            bloating_am: None,
            bloating_pm: 3,
            gas_severity: 1,
            gas_smell: GasSmell::Normal,
            night_gas: false,
            garlic_onion: false,
            high_fat: false,
            high_bread_wheat: false,
            alcohol: 0,
            spicy: false,
            adhd_meds: false,
            caffeine: 0,
            laxatives: BTreeSet::new(),
            dose_note: String::new(),
            mood: 3,
            gross_body: false,
            period_status: PeriodStatus::None,
            period_symptoms: BTreeSet::new(),
            quick_note: String::new(),
        }
    }

    /// Copy this entry onto another date.
    #[must_use]
    pub fn with_date(&self, date: NaiveDate) -> Self {
        Self {
            date,
            ..self.clone()
        }
    }

    /// Whether any period flow was recorded.
    #[must_use]
    pub fn on_period(&self) -> bool {
        self.period_status != PeriodStatus::None
    }

    /// Whether an enema was used.
    #[must_use]
    pub fn used_enema(&self) -> bool {
        self.laxatives.contains(&Laxative::Enema)
    }

    /// Number of oral laxatives taken (everything except enemas).
    #[must_use]
    pub fn oral_laxative_count(&self) -> usize {
        self.laxatives
            .iter()
            .filter(|l| **l != Laxative::Enema)
            .count()
    }

    /// Whether any dietary trigger was recorded.
    #[must_use]
    pub fn has_trigger(&self) -> bool {
        self.garlic_onion || self.high_fat || self.high_bread_wheat || self.alcohol > 0
    }

    /// Validate every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEntry`] naming the first field out of range.
    pub fn validate(&self) -> Result<()> {
        check_max("bmCount", self.bm_count, 3)?;
        if let Some(bristol) = self.bristol {
            check_range("bristol", bristol, 1, 7)?;
        }
        if let Some(am) = self.bloating_am {
            check_max("bloatingAM", am, 10)?;
        }
        check_max("bloatingPM", self.bloating_pm, 10)?;
        check_max("gasSeverity", self.gas_severity, 3)?;
        check_max("alcohol", self.alcohol, 2)?;
        check_max("caffeine", self.caffeine, 3)?;
        check_range("mood", self.mood, 1, 5)?;
        check_len("doseNote", &self.dose_note, DOSE_NOTE_MAX_CHARS)?;
        check_len("quickNote", &self.quick_note, QUICK_NOTE_MAX_CHARS)?;
        Ok(())
    }
}

fn check_max(field: &'static str, value: u8, max: u8) -> Result<()> {
    check_range(field, value, 0, max)
}

fn check_range(field: &'static str, value: u8, min: u8, max: u8) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::invalid_entry(
            field,
            format!("must be between {min} and {max}, got {value}"),
        ))
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(Error::invalid_entry(
            field,
            format!("must be at most {max} characters, got {len}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_default_entry() {
        let entry = Entry::new(day("2024-03-01"));

        assert_eq!(entry.bm_count, 0);
        assert_eq!(entry.ease, Ease::Easy);
        assert!(entry.bristol.is_none());
        assert!(entry.bloating_am.is_none());
        assert_eq!(entry.bloating_pm, 3);
        assert_eq!(entry.gas_severity, 1);
        assert_eq!(entry.mood, 3);
        assert_eq!(entry.period_status, PeriodStatus::None);
        assert!(entry.validate().is_ok());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-01-02").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("yesterday").is_err());
    }

    #[test]
    fn test_serialized_field_names() {
        let mut entry = Entry::new(day("2024-01-01"));
        entry.bloating_am = Some(4);
        entry.laxatives.insert(Laxative::Macrogol);
        entry.period_symptoms.insert(PeriodSymptom::BreastTenderness);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["date"], "2024-01-01");
        assert_eq!(json["bmCount"], 0);
        assert_eq!(json["bloatingAM"], 4);
        assert_eq!(json["bloatingPM"], 3);
        assert_eq!(json["highBreadWheat"], false);
        assert_eq!(json["bristol"], serde_json::Value::Null);
        assert_eq!(json["laxatives"][0], "macrogol");
        assert_eq!(json["periodSymptoms"][0], "breastTenderness");
        assert_eq!(json["periodStatus"], "none");
    }

    #[test]
    fn test_absent_optional_distinct_from_zero() {
        let mut entry = Entry::new(day("2024-01-01"));
        entry.bloating_am = Some(0);
        let json = serde_json::to_string(&entry).unwrap();
        let back: Entry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.bloating_am, Some(0));

        entry.bloating_am = None;
        let json = serde_json::to_string(&entry).unwrap();
        let back: Entry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.bloating_am, None);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let base = Entry::new(day("2024-01-01"));

        let mut e = base.clone();
        e.bm_count = 4;
        assert!(e.validate().unwrap_err().to_string().contains("bmCount"));

        let mut e = base.clone();
        e.bristol = Some(0);
        assert!(e.validate().unwrap_err().to_string().contains("bristol"));

        let mut e = base.clone();
        e.bloating_pm = 11;
        assert!(e.validate().unwrap_err().to_string().contains("bloatingPM"));

        let mut e = base.clone();
        e.mood = 0;
        assert!(e.validate().unwrap_err().to_string().contains("mood"));

        let mut e = base;
        e.alcohol = 3;
        assert!(e.validate().unwrap_err().to_string().contains("alcohol"));
    }

    #[test]
    fn test_validate_note_lengths_count_chars() {
        let mut entry = Entry::new(day("2024-01-01"));
        entry.dose_note = "é".repeat(DOSE_NOTE_MAX_CHARS);
        assert!(entry.validate().is_ok());

        entry.dose_note.push('x');
        assert!(entry.validate().unwrap_err().to_string().contains("doseNote"));

        entry.dose_note.clear();
        entry.quick_note = "x".repeat(QUICK_NOTE_MAX_CHARS + 1);
        assert!(entry.validate().unwrap_err().to_string().contains("quickNote"));
    }

    #[test]
    fn test_laxative_helpers() {
        let mut entry = Entry::new(day("2024-01-01"));
        assert!(!entry.used_enema());
        assert_eq!(entry.oral_laxative_count(), 0);

        entry.laxatives.insert(Laxative::Macrogol);
        entry.laxatives.insert(Laxative::Stimulant);
        entry.laxatives.insert(Laxative::Enema);
        assert!(entry.used_enema());
        assert_eq!(entry.oral_laxative_count(), 2);
    }

    #[test]
    fn test_has_trigger() {
        let mut entry = Entry::new(day("2024-01-01"));
        assert!(!entry.has_trigger());
        entry.alcohol = 1;
        assert!(entry.has_trigger());
        entry.alcohol = 0;
        entry.spicy = true;
        assert!(!entry.has_trigger());
        entry.high_fat = true;
        assert!(entry.has_trigger());
    }

    #[test]
    fn test_with_date() {
        let mut entry = Entry::new(day("2024-01-01"));
        entry.mood = 5;
        let copied = entry.with_date(day("2024-01-05"));
        assert_eq!(copied.date, day("2024-01-05"));
        assert_eq!(copied.mood, 5);
    }

    #[test]
    fn test_enum_display_matches_serde() {
        assert_eq!(Ease::Blocked.to_string(), "blocked");
        assert_eq!(PeriodSymptom::PmsMood.to_string(), "pmsMood");
        assert_eq!(
            serde_json::to_string(&PeriodSymptom::LowEnergy).unwrap(),
            "\"lowEnergy\""
        );
        assert_eq!(GasSmell::Strong.to_string(), "strong");
    }

    #[test]
    fn test_enum_from_str() {
        assert_eq!("straining".parse::<Ease>().unwrap(), Ease::Straining);
        assert_eq!(
            "breastTenderness".parse::<PeriodSymptom>().unwrap(),
            PeriodSymptom::BreastTenderness
        );
        let err = "sometimes".parse::<Laxative>().unwrap_err();
        assert!(err.contains("macrogol, stimulant, enema"));
    }
}
