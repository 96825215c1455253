//! Timeline Module
//! Maps calendar dates onto dense monthly time keys and slider labels.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

/// Ordinal of a calendar month among all months present in a dataset.
pub type TimeKey = u32;

/// Days between 0001-01-01 (CE day 1) and the unix epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Convert a polars `Date` physical value (days since epoch) into a calendar date.
pub fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(EPOCH_DAYS_FROM_CE)?)
}

/// A (year, month) pair. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    pub year: i32,
    pub month: u32,
}

impl Month {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// "Month-Year" label, e.g. `March-2020`.
    pub fn label(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%B-%Y").to_string())
            .unwrap_or_default()
    }
}

/// Distinct months and dates of a dataset, in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    months: Vec<Month>,
    dates: Vec<NaiveDate>,
}

impl Timeline {
    /// Build a timeline from dates in any order.
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let dates: BTreeSet<NaiveDate> = dates.into_iter().collect();
        let months: BTreeSet<Month> = dates.iter().copied().map(Month::of).collect();

        Self {
            months: months.into_iter().collect(),
            dates: dates.into_iter().collect(),
        }
    }

    /// Number of distinct months.
    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Upper end of the slider domain: the count of distinct months.
    pub fn max_key(&self) -> TimeKey {
        self.months.len() as TimeKey
    }

    pub fn key_of_month(&self, month: Month) -> Option<TimeKey> {
        self.months
            .binary_search(&month)
            .ok()
            .map(|idx| idx as TimeKey)
    }

    pub fn key_of(&self, date: NaiveDate) -> Option<TimeKey> {
        self.key_of_month(Month::of(date))
    }

    /// "Month-Year" label of a key, `None` outside the timeline.
    pub fn label(&self, key: TimeKey) -> Option<String> {
        self.months.get(key as usize).map(Month::label)
    }

    /// Label of the last month covered by `cutoff`. A cutoff at or past the end of the
    /// timeline covers everything and is labelled with the final month.
    pub fn period_label(&self, cutoff: TimeKey) -> String {
        self.label(cutoff)
            .or_else(|| self.months.last().map(Month::label))
            .unwrap_or_default()
    }

    /// Labels for every `every`-th distinct date (indices where `i % every == 1`),
    /// one entry per key.
    pub fn date_marks(&self, every: usize) -> Vec<(TimeKey, String)> {
        let every = every.max(1);
        let mut marks: Vec<(TimeKey, String)> = Vec::new();

        for (i, date) in self.dates.iter().enumerate() {
            if i % every != 1 % every {
                continue;
            }
            let Some(key) = self.key_of(*date) else {
                continue;
            };
            if marks.last().map(|(k, _)| *k) == Some(key) {
                continue;
            }
            marks.push((key, Month::of(*date).label()));
        }

        marks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn keys_are_dense_and_chronological() {
        let timeline = Timeline::new([
            d(2020, 3, 4),
            d(2020, 1, 10),
            d(2019, 12, 31),
            d(2020, 1, 2),
            d(2020, 3, 1),
        ]);

        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline.max_key(), 3);
        assert_eq!(timeline.key_of(d(2019, 12, 1)), Some(0));
        assert_eq!(timeline.key_of(d(2020, 1, 31)), Some(1));
        assert_eq!(timeline.key_of(d(2020, 3, 15)), Some(2));
        assert_eq!(timeline.key_of(d(2020, 2, 15)), None);

        let keys: Vec<_> = timeline
            .months
            .iter()
            .map(|m| timeline.key_of_month(*m).unwrap())
            .collect();
        assert_eq!(keys, vec![0, 1, 2]);
    }

    #[test]
    fn labels_use_full_month_name() {
        let timeline = Timeline::new([d(2020, 1, 5), d(2020, 2, 5)]);
        assert_eq!(timeline.label(0).as_deref(), Some("January-2020"));
        assert_eq!(timeline.label(1).as_deref(), Some("February-2020"));
        assert_eq!(timeline.label(2), None);
        assert_eq!(timeline.period_label(2), "February-2020");
        assert_eq!(timeline.period_label(0), "January-2020");
    }

    #[test]
    fn date_marks_take_every_nth_date() {
        // 90 consecutive days starting 2020-01-01
        let start = d(2020, 1, 1);
        let timeline = Timeline::new((0..90).map(|i| start + chrono::Days::new(i)));

        // indices 1, 31, 61 -> Jan 2, Feb 1, Mar 2
        let marks = timeline.date_marks(30);
        assert_eq!(
            marks,
            vec![
                (0, "January-2020".to_string()),
                (1, "February-2020".to_string()),
                (2, "March-2020".to_string()),
            ]
        );
    }

    #[test]
    fn date_marks_are_deduplicated_per_key() {
        let start = d(2020, 1, 1);
        let timeline = Timeline::new((0..20).map(|i| start + chrono::Days::new(i)));
        assert_eq!(timeline.date_marks(2), vec![(0, "January-2020".to_string())]);
        assert_eq!(timeline.date_marks(1).len(), 1);
    }

    #[test]
    fn epoch_days_round_trip() {
        assert_eq!(date_from_epoch_days(0), Some(d(1970, 1, 1)));
        assert_eq!(date_from_epoch_days(18_262), Some(d(2020, 1, 1)));
    }

    #[test]
    fn empty_timeline() {
        let timeline = Timeline::new(std::iter::empty());
        assert!(timeline.is_empty());
        assert_eq!(timeline.max_key(), 0);
        assert_eq!(timeline.period_label(0), "");
        assert!(timeline.date_marks(30).is_empty());
    }
}
