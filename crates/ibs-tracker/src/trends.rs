//! Rolling-window statistics and red-flag advisories.
//!
//! Everything here is a pure function of the entry map, a window size and a
//! reference "today". Days without an entry are skipped entirely: they add
//! nothing to any sum and are not counted in any denominator.

use std::ops::RangeInclusive;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};

use crate::data::Entries;
use crate::entry::{Ease, Entry, GasSmell};
use crate::error::{Error, Result};

/// Differences smaller than this are reported as [`Trend::Stable`].
pub const STABLE_THRESHOLD: f64 = 0.1;

/// Lookback for the no-BM streak, enema and blocked-day flags.
const LONG_LOOKBACK_DAYS: u32 = 30;

/// Lookback for the severe-bloating flag.
const SHORT_LOOKBACK_DAYS: u32 = 14;

const NO_BM_STREAK_THRESHOLD: u32 = 3;
const ENEMA_THRESHOLD: u32 = 2;
const BLOCKED_THRESHOLD: u32 = 7;
const SEVERE_BLOATING_LEVEL: u8 = 7;
const SEVERE_BLOATING_THRESHOLD: u32 = 5;

/// Length of a statistics window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum Window {
    /// Seven days.
    #[default]
    Week,
    /// Fourteen days.
    Fortnight,
    /// Thirty days.
    Month,
}

impl Window {
    /// All selectable windows, shortest first.
    pub const ALL: [Window; 3] = [Window::Week, Window::Fortnight, Window::Month];

    /// Number of calendar days covered.
    #[must_use]
    pub fn days(self) -> u32 {
        match self {
            Self::Week => 7,
            Self::Fortnight => 14,
            Self::Month => 30,
        }
    }

    /// Look up the window covering `days` days.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidWindow`] unless `days` is 7, 14 or 30.
    pub fn from_days(days: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|w| w.days() == days)
            .ok_or(Error::InvalidWindow { days })
    }
}

impl From<Window> for u32 {
    fn from(window: Window) -> Self {
        window.days()
    }
}

impl TryFrom<u32> for Window {
    type Error = Error;

    fn try_from(days: u32) -> Result<Self> {
        Self::from_days(days)
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} days", self.days())
    }
}

/// The calendar days `[today - offset - days + 1, today - offset]`.
fn day_span(today: NaiveDate, offset: u32, days: u32) -> RangeInclusive<NaiveDate> {
    let end = today
        .checked_sub_days(Days::new(offset.into()))
        .unwrap_or(NaiveDate::MIN);
    let start = end
        .checked_sub_days(Days::new(days.saturating_sub(1).into()))
        .unwrap_or(NaiveDate::MIN);
    start..=end
}

/// Entries recorded in the `days` calendar days ending `offset` days before `today`.
fn entries_in<'a>(
    entries: &'a Entries,
    today: NaiveDate,
    offset: u32,
    days: u32,
) -> impl Iterator<Item = &'a Entry> + 'a {
    entries.range(day_span(today, offset, days)).map(|(_, e)| e)
}

/// Summary statistics over the recorded days of one window.
///
/// Percentages are 0–100. With no recorded days every field is zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowStats {
    /// Days in the window that have an entry.
    pub days_recorded: u32,
    /// Average bowel movements per day.
    pub avg_bm_count: f64,
    /// Share of days with no bowel movement.
    pub no_bm_percent: f64,
    /// Average evening bloating.
    #[serde(rename = "avgBloatingPM")]
    pub avg_bloating_pm: f64,
    /// Average morning bloating over the days it was recorded.
    #[serde(rename = "avgBloatingAM")]
    pub avg_bloating_am: f64,
    /// Average gas severity.
    pub avg_gas_severity: f64,
    /// Share of days with strong-smelling gas.
    pub strong_smell_percent: f64,
    /// Share of days that felt blocked.
    pub blocked_percent: f64,
    /// Share of days with incomplete emptying.
    pub incomplete_percent: f64,
    /// Share of days with garlic or onion.
    pub garlic_onion_percent: f64,
    /// Share of days with a high-fat meal.
    pub high_fat_percent: f64,
    /// Share of days with a lot of bread or wheat.
    pub high_bread_percent: f64,
    /// Share of days with any alcohol.
    pub alcohol_percent: f64,
    /// Share of days with ADHD medication.
    pub adhd_meds_percent: f64,
    /// Average caffeinated drinks per day.
    pub avg_caffeine: f64,
    /// Oral laxative doses taken (enemas excluded).
    pub laxative_uses: u32,
    /// Days an enema was used.
    pub enema_uses: u32,
    /// Share of days on period.
    pub period_percent: f64,
    /// Average evening bloating on period days.
    pub bloating_on_period: f64,
    /// Average evening bloating on other days.
    pub bloating_off_period: f64,
}

#[derive(Debug, Default)]
struct Tally {
    total: u32,
    bm_sum: u32,
    no_bm: u32,
    bloating_pm_sum: u32,
    bloating_am_sum: u32,
    bloating_am_days: u32,
    gas_sum: u32,
    strong_smell: u32,
    blocked: u32,
    incomplete: u32,
    garlic_onion: u32,
    high_fat: u32,
    high_bread: u32,
    alcohol: u32,
    adhd_meds: u32,
    caffeine_sum: u32,
    laxatives: u32,
    enemas: u32,
    period_days: u32,
    bloating_on_sum: u32,
    bloating_off_sum: u32,
}

impl Tally {
    fn add(&mut self, e: &Entry) {
        self.total += 1;
        self.bm_sum += u32::from(e.bm_count);
        self.no_bm += u32::from(e.bm_count == 0);
        self.bloating_pm_sum += u32::from(e.bloating_pm);
        if let Some(am) = e.bloating_am {
            self.bloating_am_sum += u32::from(am);
            self.bloating_am_days += 1;
        }
        self.gas_sum += u32::from(e.gas_severity);
        self.strong_smell += u32::from(e.gas_smell == GasSmell::Strong);
        self.blocked += u32::from(e.ease == Ease::Blocked);
        self.incomplete += u32::from(e.incomplete_emptying);
        self.garlic_onion += u32::from(e.garlic_onion);
        self.high_fat += u32::from(e.high_fat);
        self.high_bread += u32::from(e.high_bread_wheat);
        self.alcohol += u32::from(e.alcohol > 0);
        self.adhd_meds += u32::from(e.adhd_meds);
        self.caffeine_sum += u32::from(e.caffeine);
        self.laxatives += u32::try_from(e.oral_laxative_count()).unwrap_or(u32::MAX);
        self.enemas += u32::from(e.used_enema());
        if e.on_period() {
            self.period_days += 1;
            self.bloating_on_sum += u32::from(e.bloating_pm);
        } else {
            self.bloating_off_sum += u32::from(e.bloating_pm);
        }
    }

    fn finish(&self) -> WindowStats {
        if self.total == 0 {
            return WindowStats::default();
        }
        let avg = |sum: u32| ratio(sum, self.total);
        let pct = |count: u32| ratio(count, self.total) * 100.0;

        WindowStats {
            days_recorded: self.total,
            avg_bm_count: avg(self.bm_sum),
            no_bm_percent: pct(self.no_bm),
            avg_bloating_pm: avg(self.bloating_pm_sum),
            avg_bloating_am: ratio(self.bloating_am_sum, self.bloating_am_days),
            avg_gas_severity: avg(self.gas_sum),
            strong_smell_percent: pct(self.strong_smell),
            blocked_percent: pct(self.blocked),
            incomplete_percent: pct(self.incomplete),
            garlic_onion_percent: pct(self.garlic_onion),
            high_fat_percent: pct(self.high_fat),
            high_bread_percent: pct(self.high_bread),
            alcohol_percent: pct(self.alcohol),
            adhd_meds_percent: pct(self.adhd_meds),
            avg_caffeine: avg(self.caffeine_sum),
            laxative_uses: self.laxatives,
            enema_uses: self.enemas,
            period_percent: pct(self.period_days),
            bloating_on_period: ratio(self.bloating_on_sum, self.period_days),
            bloating_off_period: ratio(self.bloating_off_sum, self.total - self.period_days),
        }
    }
}

/// `num / den`, or 0 when there is nothing to divide by.
fn ratio(num: u32, den: u32) -> f64 {
    if den == 0 {
        0.0
    } else {
        f64::from(num) / f64::from(den)
    }
}

impl WindowStats {
    /// Compute statistics over a set of entries.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        let mut tally = Tally::default();
        for entry in entries {
            tally.add(entry);
        }
        tally.finish()
    }

    /// Statistics for the `window` days ending at `today`.
    #[must_use]
    pub fn current(entries: &Entries, window: Window, today: NaiveDate) -> Self {
        Self::from_entries(entries_in(entries, today, 0, window.days()))
    }

    /// Statistics for the `window` days immediately before the current window.
    #[must_use]
    pub fn previous(entries: &Entries, window: Window, today: NaiveDate) -> Self {
        let days = window.days();
        Self::from_entries(entries_in(entries, today, days, days))
    }
}

/// Direction a metric moved between two windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Current is higher.
    Up,
    /// Current is lower.
    Down,
    /// Within [`STABLE_THRESHOLD`] of each other.
    Stable,
}

impl Trend {
    /// Classify the move from `previous` to `current`.
    ///
    /// The threshold is absolute: it does not scale with the metric.
    #[must_use]
    pub fn classify(current: f64, previous: f64) -> Self {
        if (current - previous).abs() < STABLE_THRESHOLD {
            Self::Stable
        } else if current > previous {
            Self::Up
        } else {
            Self::Down
        }
    }

    /// Short marker for terminal output.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Up => "↑",
            Self::Down => "↓",
            Self::Stable => "→",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::Stable => write!(f, "stable"),
        }
    }
}

/// A statistic that is compared between windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    /// [`WindowStats::avg_bm_count`]
    AvgBmCount,
    /// [`WindowStats::no_bm_percent`]
    NoBmPercent,
    /// [`WindowStats::blocked_percent`]
    BlockedPercent,
    /// [`WindowStats::incomplete_percent`]
    IncompletePercent,
    /// [`WindowStats::avg_bloating_pm`]
    #[serde(rename = "avgBloatingPM")]
    AvgBloatingPm,
    /// [`WindowStats::avg_bloating_am`]
    #[serde(rename = "avgBloatingAM")]
    AvgBloatingAm,
    /// [`WindowStats::avg_gas_severity`]
    AvgGasSeverity,
    /// [`WindowStats::strong_smell_percent`]
    StrongSmellPercent,
    /// [`WindowStats::garlic_onion_percent`]
    GarlicOnionPercent,
    /// [`WindowStats::high_fat_percent`]
    HighFatPercent,
    /// [`WindowStats::high_bread_percent`]
    HighBreadPercent,
    /// [`WindowStats::alcohol_percent`]
    AlcoholPercent,
    /// [`WindowStats::adhd_meds_percent`]
    AdhdMedsPercent,
    /// [`WindowStats::avg_caffeine`]
    AvgCaffeine,
    /// [`WindowStats::period_percent`]
    PeriodPercent,
}

impl Metric {
    /// Every compared metric, in display order.
    pub const ALL: [Metric; 15] = [
        Metric::AvgBmCount,
        Metric::NoBmPercent,
        Metric::BlockedPercent,
        Metric::IncompletePercent,
        Metric::AvgBloatingPm,
        Metric::AvgBloatingAm,
        Metric::AvgGasSeverity,
        Metric::StrongSmellPercent,
        Metric::GarlicOnionPercent,
        Metric::HighFatPercent,
        Metric::HighBreadPercent,
        Metric::AlcoholPercent,
        Metric::AdhdMedsPercent,
        Metric::AvgCaffeine,
        Metric::PeriodPercent,
    ];

    /// Human-readable name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::AvgBmCount => "Avg BM Count",
            Self::NoBmPercent => "Days with No BM",
            Self::BlockedPercent => "Blocked Feeling",
            Self::IncompletePercent => "Incomplete Emptying",
            Self::AvgBloatingPm => "Avg Evening Bloating",
            Self::AvgBloatingAm => "Avg Morning Bloating",
            Self::AvgGasSeverity => "Avg Gas Severity",
            Self::StrongSmellPercent => "Strong Smell Days",
            Self::GarlicOnionPercent => "Garlic/Onion",
            Self::HighFatPercent => "High Fat",
            Self::HighBreadPercent => "High Bread/Wheat",
            Self::AlcoholPercent => "Alcohol",
            Self::AdhdMedsPercent => "ADHD Meds Days",
            Self::AvgCaffeine => "Avg Caffeine",
            Self::PeriodPercent => "Days on Period",
        }
    }

    /// Whether the value is a percentage.
    #[must_use]
    pub fn is_percent(self) -> bool {
        !matches!(
            self,
            Self::AvgBmCount
                | Self::AvgBloatingPm
                | Self::AvgBloatingAm
                | Self::AvgGasSeverity
                | Self::AvgCaffeine
        )
    }

    /// Whether a rising value is an improvement.
    #[must_use]
    pub fn higher_is_better(self) -> bool {
        self == Self::AvgBmCount
    }

    /// Read this metric out of a set of statistics.
    #[must_use]
    pub fn value(self, stats: &WindowStats) -> f64 {
        match self {
            Self::AvgBmCount => stats.avg_bm_count,
            Self::NoBmPercent => stats.no_bm_percent,
            Self::BlockedPercent => stats.blocked_percent,
            Self::IncompletePercent => stats.incomplete_percent,
            Self::AvgBloatingPm => stats.avg_bloating_pm,
            Self::AvgBloatingAm => stats.avg_bloating_am,
            Self::AvgGasSeverity => stats.avg_gas_severity,
            Self::StrongSmellPercent => stats.strong_smell_percent,
            Self::GarlicOnionPercent => stats.garlic_onion_percent,
            Self::HighFatPercent => stats.high_fat_percent,
            Self::HighBreadPercent => stats.high_bread_percent,
            Self::AlcoholPercent => stats.alcohol_percent,
            Self::AdhdMedsPercent => stats.adhd_meds_percent,
            Self::AvgCaffeine => stats.avg_caffeine,
            Self::PeriodPercent => stats.period_percent,
        }
    }
}

/// One metric compared across the current and previous windows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricTrend {
    /// Which statistic.
    pub metric: Metric,
    /// Value in the current window.
    pub current: f64,
    /// Value in the previous window.
    pub previous: f64,
    /// Direction of change.
    pub trend: Trend,
}

impl MetricTrend {
    /// Compare one metric across two windows.
    #[must_use]
    pub fn compare(metric: Metric, current: &WindowStats, previous: &WindowStats) -> Self {
        let (current, previous) = (metric.value(current), metric.value(previous));
        Self {
            metric,
            current,
            previous,
            trend: Trend::classify(current, previous),
        }
    }

    /// Whether the change is an improvement, a regression, or neither.
    #[must_use]
    pub fn is_improvement(&self) -> Option<bool> {
        match self.trend {
            Trend::Stable => None,
            Trend::Up => Some(self.metric.higher_is_better()),
            Trend::Down => Some(!self.metric.higher_is_better()),
        }
    }
}

/// A rule-based advisory suggesting medical review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedFlag {
    /// Longest run of consecutive recorded days with no bowel movement.
    NoBowelMovement {
        /// Length of the run.
        days: u32,
    },
    /// Enema days in the last 30 days.
    FrequentEnema {
        /// Number of days.
        count: u32,
    },
    /// Blocked days in the last 30 days.
    FrequentBlocked {
        /// Number of days.
        count: u32,
    },
    /// Days with evening bloating of 7 or more in the last 14 days.
    SevereBloating {
        /// Number of days.
        count: u32,
    },
}

impl std::fmt::Display for RedFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoBowelMovement { days } => {
                write!(f, "No bowel movement for {days} consecutive days")
            }
            Self::FrequentEnema { count } => {
                write!(f, "Enema used {count} times in last 30 days")
            }
            Self::FrequentBlocked { count } => {
                write!(f, "Blocked feeling on {count} days in last 30 days")
            }
            Self::SevereBloating { count } => {
                write!(f, "Severe bloating (≥7) on {count} days in last 14 days")
            }
        }
    }
}

impl Serialize for RedFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Longest run of consecutive days ending within the lookback with `bmCount == 0`.
///
/// A day without an entry ends the run.
fn longest_no_bm_run(entries: &Entries, today: NaiveDate) -> u32 {
    let mut run = 0;
    let mut longest = 0;
    for date in day_span(today, 0, LONG_LOOKBACK_DAYS).start().iter_days() {
        if date > today {
            break;
        }
        if entries.get(&date).is_some_and(|e| e.bm_count == 0) {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest
}

fn count_days(entries: &Entries, today: NaiveDate, days: u32, pred: impl Fn(&Entry) -> bool) -> u32 {
    let count = entries_in(entries, today, 0, days).filter(|e| pred(e)).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

/// Evaluate all red-flag rules as of `today`.
///
/// Independent of any selected window. Returns zero to four flags in a fixed
/// order.
#[must_use]
pub fn red_flags(entries: &Entries, today: NaiveDate) -> Vec<RedFlag> {
    let mut flags = Vec::new();

    let run = longest_no_bm_run(entries, today);
    if run >= NO_BM_STREAK_THRESHOLD {
        flags.push(RedFlag::NoBowelMovement { days: run });
    }

    let enemas = count_days(entries, today, LONG_LOOKBACK_DAYS, Entry::used_enema);
    if enemas >= ENEMA_THRESHOLD {
        flags.push(RedFlag::FrequentEnema { count: enemas });
    }

    let blocked = count_days(entries, today, LONG_LOOKBACK_DAYS, |e| {
        e.ease == Ease::Blocked
    });
    if blocked >= BLOCKED_THRESHOLD {
        flags.push(RedFlag::FrequentBlocked { count: blocked });
    }

    let severe = count_days(entries, today, SHORT_LOOKBACK_DAYS, |e| {
        e.bloating_pm >= SEVERE_BLOATING_LEVEL
    });
    if severe >= SEVERE_BLOATING_THRESHOLD {
        flags.push(RedFlag::SevereBloating { count: severe });
    }

    flags
}

/// One day's value in a chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyPoint {
    /// The day.
    pub date: NaiveDate,
    /// The recorded value.
    pub value: u8,
}

/// Evening bloating for each recorded day of the last 30, oldest first.
#[must_use]
pub fn bloating_series(entries: &Entries, today: NaiveDate) -> Vec<DailyPoint> {
    entries_in(entries, today, 0, LONG_LOOKBACK_DAYS)
        .map(|e| DailyPoint {
            date: e.date,
            value: e.bloating_pm,
        })
        .collect()
}

/// Bowel movement count for each recorded day of the last 14, oldest first.
#[must_use]
pub fn bm_series(entries: &Entries, today: NaiveDate) -> Vec<DailyPoint> {
    entries_in(entries, today, 0, SHORT_LOOKBACK_DAYS)
        .map(|e| DailyPoint {
            date: e.date,
            value: e.bm_count,
        })
        .collect()
}

/// Everything the trends view shows for one window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendReport {
    /// Selected window.
    pub window: Window,
    /// Reference date.
    pub today: NaiveDate,
    /// Statistics for the current window.
    pub current: WindowStats,
    /// Statistics for the preceding window.
    pub previous: WindowStats,
    /// Per-metric comparison, in [`Metric::ALL`] order.
    pub metrics: Vec<MetricTrend>,
    /// Advisories, independent of the window.
    pub red_flags: Vec<RedFlag>,
}

impl TrendReport {
    /// Build the report for `window` as of `today`.
    #[must_use]
    pub fn build(entries: &Entries, window: Window, today: NaiveDate) -> Self {
        let current = WindowStats::current(entries, window, today);
        let previous = WindowStats::previous(entries, window, today);
        let metrics = Metric::ALL
            .into_iter()
            .map(|m| MetricTrend::compare(m, &current, &previous))
            .collect();

        Self {
            window,
            today,
            current,
            previous,
            metrics,
            red_flags: red_flags(entries, today),
        }
    }

    /// The comparison for one metric.
    #[must_use]
    pub fn metric(&self, metric: Metric) -> Option<&MetricTrend> {
        self.metrics.iter().find(|m| m.metric == metric)
    }

    /// Advisory messages, one per flag.
    #[must_use]
    pub fn advisories(&self) -> Vec<String> {
        self.red_flags.iter().map(ToString::to_string).collect()
    }
}
