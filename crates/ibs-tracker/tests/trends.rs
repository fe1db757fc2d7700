//! Trend engine scenarios and properties.

use chrono::{Days, NaiveDate};
use ibs_tracker::data::Entries;
use ibs_tracker::trends::{red_flags, Metric, RedFlag, Trend, TrendReport, Window, WindowStats};
use ibs_tracker::Entry;
use proptest::prelude::*;

fn day(s: &str) -> NaiveDate {
    ibs_tracker::entry::parse_date(s).unwrap()
}

fn back(today: NaiveDate, n: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(n)).unwrap()
}

fn insert(entries: &mut Entries, entry: Entry) {
    entries.insert(entry.date, entry);
}

#[test]
fn average_bloating_over_two_recorded_days() {
    let mut entries = Entries::new();
    let mut first = Entry::new(day("2024-01-01"));
    first.bloating_pm = 8;
    let mut second = Entry::new(day("2024-01-02"));
    second.bloating_pm = 2;
    insert(&mut entries, first);
    insert(&mut entries, second);

    let report = TrendReport::build(&entries, Window::Week, day("2024-01-02"));
    assert!((report.current.avg_bloating_pm - 5.0).abs() < f64::EPSILON);
    let metric = report.metric(Metric::AvgBloatingPm).unwrap();
    assert_eq!(metric.trend, Trend::Up);
    assert!(metric.previous.abs() < f64::EPSILON);
}

#[test]
fn three_day_run_is_the_only_flag() {
    let today = day("2024-05-31");
    let mut entries = Entries::new();
    for n in 0..30 {
        let mut entry = Entry::new(back(today, n));
        entry.bm_count = if n < 3 { 0 } else { 1 };
        insert(&mut entries, entry);
    }

    let flags = red_flags(&entries, today);
    assert_eq!(flags, vec![RedFlag::NoBowelMovement { days: 3 }]);

    let report = TrendReport::build(&entries, Window::Month, today);
    assert_eq!(
        report.advisories(),
        vec!["No bowel movement for 3 consecutive days".to_string()]
    );
}

#[test]
fn red_flags_ignore_selected_window() {
    let today = day("2024-05-31");
    let mut entries = Entries::new();
    for n in 20..24 {
        let mut entry = Entry::new(back(today, n));
        entry.bm_count = 0;
        insert(&mut entries, entry);
    }

    for window in Window::ALL {
        let report = TrendReport::build(&entries, window, today);
        assert_eq!(report.red_flags, vec![RedFlag::NoBowelMovement { days: 4 }]);
    }
}

#[test]
fn month_window_previous_is_days_thirty_to_fifty_nine() {
    let today = day("2024-05-31");
    let mut entries = Entries::new();
    let mut inside = Entry::new(back(today, 30));
    inside.caffeine = 2;
    let mut edge = Entry::new(back(today, 59));
    edge.caffeine = 0;
    let mut outside = Entry::new(back(today, 60));
    outside.caffeine = 3;
    insert(&mut entries, inside);
    insert(&mut entries, edge);
    insert(&mut entries, outside);

    let previous = WindowStats::previous(&entries, Window::Month, today);
    assert_eq!(previous.days_recorded, 2);
    assert!((previous.avg_caffeine - 1.0).abs() < f64::EPSILON);
}

fn arb_entry(date: NaiveDate) -> impl Strategy<Value = Entry> {
    (0u8..=3, 0u8..=10, 0u8..=3, 0u8..=2, any::<bool>()).prop_map(
        move |(bm, bloating, gas, alcohol, garlic)| {
            let mut entry = Entry::new(date);
            entry.bm_count = bm;
            entry.bloating_pm = bloating;
            entry.gas_severity = gas;
            entry.alcohol = alcohol;
            entry.garlic_onion = garlic;
            entry
        },
    )
}

fn arb_history() -> impl Strategy<Value = Entries> {
    let base = day("2024-01-01");
    prop::collection::vec((0u64..120).prop_flat_map(move |offset| {
        arb_entry(base.checked_add_days(Days::new(offset)).unwrap())
    }), 0..60)
    .prop_map(|list| list.into_iter().map(|e| (e.date, e)).collect())
}

proptest! {
    #[test]
    fn trend_is_stable_within_threshold(a in -100.0f64..100.0, b in -100.0f64..100.0) {
        let trend = Trend::classify(a, b);
        if (a - b).abs() < 0.1 {
            prop_assert_eq!(trend, Trend::Stable);
        } else if a > b {
            prop_assert_eq!(trend, Trend::Up);
        } else {
            prop_assert_eq!(trend, Trend::Down);
        }
    }

    #[test]
    fn window_without_entries_is_all_zero(entries in arb_history(), gap in 0u64..400) {
        // Every generated entry is on or before 2024-04-29.
        let today = day("2024-04-30")
            .checked_add_days(Days::new(gap + 30))
            .unwrap();
        for window in Window::ALL {
            prop_assert_eq!(
                WindowStats::current(&entries, window, today),
                WindowStats::default()
            );
        }
    }

    #[test]
    fn percentages_stay_in_range(entries in arb_history()) {
        let today = day("2024-04-30");
        for window in Window::ALL {
            let stats = WindowStats::current(&entries, window, today);
            prop_assert!(stats.days_recorded <= window.days());
            for metric in Metric::ALL {
                let value = metric.value(&stats);
                prop_assert!(value >= 0.0);
                if metric.is_percent() {
                    prop_assert!(value <= 100.0);
                }
            }
        }
    }

    #[test]
    fn report_never_panics(entries in arb_history(), offset in 0u64..200) {
        let today = day("2024-01-01").checked_add_days(Days::new(offset)).unwrap();
        let report = TrendReport::build(&entries, Window::Fortnight, today);
        prop_assert_eq!(report.metrics.len(), Metric::ALL.len());
        prop_assert!(report.red_flags.len() <= 4);
    }
}
