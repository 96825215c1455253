//! Data Pipeline Module
//! Cleans the country-day table, assigns monthly time keys and answers
//! cumulative per-location queries for a slider cutoff.

use super::loader::{read_csv, DataSource, Fetch, LoadError};
use super::timeline::{date_from_epoch_days, Timeline, TimeKey};
use polars::prelude::*;
use std::ops::Deref;
use thiserror::Error;
use tracing::{debug, info};

pub const LOCATION: &str = "location";
pub const DATE: &str = "date";
pub const NEW_CASES: &str = "new_cases";
pub const NEW_DEATHS: &str = "new_deaths";
pub const KEY: &str = "key";

/// Length of the two rankings.
pub const TOP_N: usize = 5;

const REQUIRED_COLUMNS: [&str; 4] = [LOCATION, DATE, NEW_CASES, NEW_DEATHS];

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Load-time cleaning options.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Aggregate rows (e.g. "World") that must not be counted as a location.
    pub excluded_locations: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            excluded_locations: vec!["World".to_string()],
        }
    }
}

/// Cleaned, date-sorted records with their monthly keys. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct RecordSet {
    df: DataFrame,
    timeline: Timeline,
}

impl Deref for RecordSet {
    type Target = DataFrame;

    fn deref(&self) -> &Self::Target {
        &self.df
    }
}

impl RecordSet {
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }
}

/// Summed statistics for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationTotals {
    pub location: String,
    pub new_cases: f64,
    pub new_deaths: f64,
}

/// Answer to a cutoff query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateResult {
    pub cutoff: i64,
    /// Every location with at least one record in range, by new_cases descending.
    pub totals: Vec<LocationTotals>,
    pub top_cases: Vec<LocationTotals>,
    pub top_deaths: Vec<LocationTotals>,
}

impl AggregateResult {
    pub fn total_cases(&self) -> f64 {
        self.totals.iter().map(|t| t.new_cases).sum()
    }

    pub fn total_deaths(&self) -> f64 {
        self.totals.iter().map(|t| t.new_deaths).sum()
    }

    #[allow(dead_code)]
    pub fn get(&self, location: &str) -> Option<&LocationTotals> {
        self.totals.iter().find(|t| t.location == location)
    }
}

/// Load and query operations over a [`RecordSet`].
///
/// Loading is stateless; a pipeline value only carries the ranking length used by
/// [`DataPipeline::query`].
#[derive(Debug, Clone, Copy)]
pub struct DataPipeline {
    top_n: usize,
}

impl Default for DataPipeline {
    fn default() -> Self {
        Self { top_n: TOP_N }
    }
}

impl DataPipeline {
    pub fn with_top_n(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Fetch and clean a dataset.
    pub fn load(source: &DataSource, options: &LoadOptions) -> Result<RecordSet, LoadError> {
        let bytes = source.fetch()?;
        Self::load_bytes(bytes, options)
    }

    /// Clean an already fetched CSV buffer.
    pub fn load_bytes(bytes: Vec<u8>, options: &LoadOptions) -> Result<RecordSet, LoadError> {
        let raw = read_csv(bytes, &Self::column_types())?;
        Self::from_frame(raw, options)
    }

    /// Dtypes pinned at parse time so a stray value fails the load instead of
    /// being inferred away.
    fn column_types() -> [(&'static str, DataType); 4] {
        [
            (LOCATION, DataType::String),
            (DATE, DataType::String),
            (NEW_CASES, DataType::Float64),
            (NEW_DEATHS, DataType::Float64),
        ]
    }

    /// Drop excluded rows, fill null counts with 0, sort by date and attach time keys.
    pub fn from_frame(raw: DataFrame, options: &LoadOptions) -> Result<RecordSet, LoadError> {
        let schema = raw.schema();
        for name in REQUIRED_COLUMNS {
            if !schema.contains(name) {
                return Err(LoadError::MissingColumn(name));
            }
        }

        let date_expr = match raw.column(DATE)?.dtype() {
            DataType::String => col(DATE).str().to_date(StrptimeOptions {
                format: Some("%Y-%m-%d".into()),
                strict: false,
                ..Default::default()
            }),
            _ => col(DATE).cast(DataType::Date),
        };

        let keep = options
            .excluded_locations
            .iter()
            .fold(col(LOCATION).is_not_null(), |acc, name| {
                acc.and(col(LOCATION).neq(lit(name.as_str())))
            });

        let mut df = raw
            .lazy()
            .select([
                col(LOCATION).cast(DataType::String),
                date_expr.alias(DATE),
                col(NEW_CASES).cast(DataType::Float64).fill_null(lit(0.0)),
                col(NEW_DEATHS).cast(DataType::Float64).fill_null(lit(0.0)),
            ])
            .filter(keep.and(col(DATE).is_not_null()))
            .sort([DATE], SortMultipleOptions::default().with_maintain_order(true))
            .collect()?;

        let dates: Vec<_> = df
            .column(DATE)?
            .cast(&DataType::Int32)?
            .i32()?
            .into_iter()
            .map(|days| days.and_then(date_from_epoch_days))
            .collect();

        let timeline = Timeline::new(dates.iter().flatten().copied());
        let keys: Vec<Option<i64>> = dates
            .iter()
            .map(|date| date.and_then(|d| timeline.key_of(d)).map(i64::from))
            .collect();
        df.with_column(Column::new(KEY.into(), keys))?;

        info!(
            records = df.height(),
            months = timeline.len(),
            "dataset loaded"
        );

        Ok(RecordSet { df, timeline })
    }

    /// Upper bound of the slider domain: the number of distinct months.
    pub fn max_time_key(records: &RecordSet) -> TimeKey {
        records.timeline.max_key()
    }

    /// Per-location totals for `0 <= key <= cutoff` plus the two rankings.
    ///
    /// Locations are grouped in order of first appearance in the date-sorted table.
    /// The cases ranking is a stable sort of that order and the deaths ranking is a
    /// stable sort of the cases ranking, so ties keep their earlier position.
    pub fn query(
        &self,
        records: &RecordSet,
        cutoff: i64,
    ) -> Result<AggregateResult, PipelineError> {
        let top_n = self.top_n;
        if cutoff < 0 {
            return Ok(AggregateResult {
                cutoff,
                ..Default::default()
            });
        }

        let grouped = records
            .df
            .clone()
            .lazy()
            .filter(col(KEY).gt_eq(lit(0i64)).and(col(KEY).lt_eq(lit(cutoff))))
            .group_by_stable([col(LOCATION)])
            .agg([col(NEW_CASES).sum(), col(NEW_DEATHS).sum()])
            .collect()?;

        let mut totals = Self::collect_totals(&grouped)?;
        totals.sort_by(|a, b| b.new_cases.total_cmp(&a.new_cases));

        let top_cases: Vec<LocationTotals> = totals.iter().take(top_n).cloned().collect();

        let mut by_deaths = totals.clone();
        by_deaths.sort_by(|a, b| b.new_deaths.total_cmp(&a.new_deaths));
        by_deaths.truncate(top_n);

        debug!(cutoff, locations = totals.len(), "query evaluated");

        Ok(AggregateResult {
            cutoff,
            totals,
            top_cases,
            top_deaths: by_deaths,
        })
    }

    fn collect_totals(grouped: &DataFrame) -> Result<Vec<LocationTotals>, PipelineError> {
        let locations = grouped.column(LOCATION)?.str()?;
        let cases = grouped.column(NEW_CASES)?.f64()?;
        let deaths = grouped.column(NEW_DEATHS)?.f64()?;

        let totals = locations
            .into_iter()
            .zip(cases.into_iter())
            .zip(deaths.into_iter())
            .filter_map(|((location, cases), deaths)| {
                Some(LocationTotals {
                    location: location?.to_string(),
                    new_cases: cases.unwrap_or(0.0),
                    new_deaths: deaths.unwrap_or(0.0),
                })
            })
            .collect();

        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> RecordSet {
        DataPipeline::load_bytes(csv.as_bytes().to_vec(), &LoadOptions::default()).unwrap()
    }

    fn cases(result: &AggregateResult, location: &str) -> f64 {
        result.get(location).map(|t| t.new_cases).unwrap_or(0.0)
    }

    const SAMPLE: &str = "\
iso_code,continent,location,date,total_cases,new_cases,new_deaths
AAA,Europe,A,2020-01-03,10,10,1
BBB,Europe,B,2020-01-20,5,5,0
OWID_WRL,,World,2020-01-20,15,15,1
AAA,Europe,A,2020-02-11,30,20,2
";

    #[test]
    fn worked_example() {
        let records = load(SAMPLE);
        assert_eq!(DataPipeline::max_time_key(&records), 2);

        let jan = DataPipeline::default().query(&records, 0).unwrap();
        assert_eq!(jan.totals.len(), 2);
        assert_eq!(cases(&jan, "A"), 10.0);
        assert_eq!(cases(&jan, "B"), 5.0);

        let feb = DataPipeline::default().query(&records, 1).unwrap();
        assert_eq!(cases(&feb, "A"), 30.0);
        assert_eq!(cases(&feb, "B"), 5.0);
        assert_eq!(feb.get("A").unwrap().new_deaths, 3.0);
    }

    #[test]
    fn world_rows_are_excluded() {
        let records = load(SAMPLE);
        assert_eq!(records.len(), 3);

        let all = DataPipeline::default().query(&records, 2).unwrap();
        assert!(all.get("World").is_none());
        assert_eq!(all.total_cases(), 35.0);
    }

    #[test]
    fn excluded_locations_are_configurable() {
        let options = LoadOptions {
            excluded_locations: vec!["World".to_string(), "B".to_string()],
        };
        let records = DataPipeline::load_bytes(SAMPLE.as_bytes().to_vec(), &options).unwrap();
        let all = DataPipeline::default().query(&records, 2).unwrap();
        assert_eq!(all.totals.len(), 1);
        assert_eq!(all.totals[0].location, "A");
    }

    #[test]
    fn keys_follow_calendar_months() {
        let records = load(
            "location,date,new_cases,new_deaths
A,2020-03-02,1,0
A,2019-12-30,1,0
B,2020-01-15,1,0
B,2020-03-20,1,0
",
        );

        let keys: Vec<Option<i64>> = records.column(KEY).unwrap().i64().unwrap().into_iter().collect();
        // sorted by date: 2019-12-30, 2020-01-15, 2020-03-02, 2020-03-20
        assert_eq!(keys, vec![Some(0), Some(1), Some(2), Some(2)]);
        assert_eq!(records.timeline().label(2).as_deref(), Some("March-2020"));
    }

    #[test]
    fn null_counts_are_zero() {
        let records = load(
            "location,date,new_cases,new_deaths
A,2020-01-01,,
A,2020-01-02,4,
B,2020-01-02,,2
",
        );
        let result = DataPipeline::default().query(&records, 0).unwrap();
        assert_eq!(cases(&result, "A"), 4.0);
        assert_eq!(cases(&result, "B"), 0.0);
        assert_eq!(result.get("B").unwrap().new_deaths, 2.0);
    }

    #[test]
    fn unparsable_dates_are_dropped() {
        let records = load(
            "location,date,new_cases,new_deaths
A,2020-01-01,1,0
A,not-a-date,100,0
",
        );
        assert_eq!(records.len(), 1);
        assert_eq!(DataPipeline::max_time_key(&records), 1);
    }

    #[test]
    fn missing_column_is_rejected() {
        let err = DataPipeline::load_bytes(
            b"location,date,new_cases\nA,2020-01-01,1\n".to_vec(),
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(NEW_DEATHS)));
    }

    #[test]
    fn accumulation_is_monotonic() {
        let mut csv = String::from("location,date,new_cases,new_deaths\n");
        for month in 1..=6 {
            for (i, loc) in ["A", "B", "C"].iter().enumerate() {
                csv.push_str(&format!(
                    "{},2021-{:02}-1{},{},{}\n",
                    loc,
                    month,
                    i,
                    month * (i + 1),
                    i
                ));
            }
        }
        let records = load(&csv);
        let max = DataPipeline::max_time_key(&records) as i64;

        let mut previous = 0.0;
        for cutoff in 0..=max {
            let total = DataPipeline::default().query(&records, cutoff).unwrap().total_cases();
            assert!(total >= previous, "cutoff {cutoff}: {total} < {previous}");
            previous = total;
        }
    }

    #[test]
    fn max_cutoff_covers_whole_dataset() {
        let records = load(SAMPLE);
        let max = DataPipeline::max_time_key(&records) as i64;
        let result = DataPipeline::default().query(&records, max).unwrap();

        let all_cases: f64 = records
            .column(NEW_CASES)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .sum();
        assert_eq!(result.total_cases(), all_cases);
        let last_month = DataPipeline::default().query(&records, max - 1).unwrap();
        assert_eq!(result, last_month.with_cutoff(max));
    }

    #[test]
    fn negative_cutoff_is_empty() {
        let records = load(SAMPLE);
        let result = DataPipeline::default().query(&records, -1).unwrap();
        assert!(result.totals.is_empty());
        assert!(result.top_cases.is_empty());
        assert!(result.top_deaths.is_empty());
    }

    #[test]
    fn rankings_are_sorted_and_bounded() {
        let mut csv = String::from("location,date,new_cases,new_deaths\n");
        let rows = [
            ("A", 3, 9),
            ("B", 8, 1),
            ("C", 1, 4),
            ("D", 6, 6),
            ("E", 7, 2),
            ("F", 2, 8),
            ("G", 5, 3),
        ];
        for (loc, c, d) in rows {
            csv.push_str(&format!("{loc},2020-05-01,{c},{d}\n"));
        }
        let records = load(&csv);
        let result = DataPipeline::default().query(&records, 0).unwrap();

        assert_eq!(result.totals.len(), 7);
        assert_eq!(result.top_cases.len(), TOP_N);
        assert_eq!(result.top_deaths.len(), TOP_N);

        let top_cases: Vec<&str> = result.top_cases.iter().map(|t| t.location.as_str()).collect();
        assert_eq!(top_cases, vec!["B", "E", "D", "G", "A"]);
        let top_deaths: Vec<&str> = result.top_deaths.iter().map(|t| t.location.as_str()).collect();
        assert_eq!(top_deaths, vec!["A", "F", "D", "C", "G"]);

        assert!(result
            .top_cases
            .windows(2)
            .all(|w| w[0].new_cases >= w[1].new_cases));
        assert!(result
            .top_deaths
            .windows(2)
            .all(|w| w[0].new_deaths >= w[1].new_deaths));
    }

    #[test]
    fn rankings_shorter_than_top_n() {
        let records = load(SAMPLE);
        let result = DataPipeline::default().query(&records, 0).unwrap();
        assert_eq!(result.top_cases.len(), 2);
        assert_eq!(result.top_cases[0].location, "A");

        let top_one = DataPipeline::with_top_n(1).query(&records, 0).unwrap();
        assert_eq!(top_one.top_cases.len(), 1);
        assert_eq!(top_one.totals.len(), 2);
    }

    #[test]
    fn ties_keep_first_appearance() {
        let records = load(
            "location,date,new_cases,new_deaths
C,2020-01-01,5,1
A,2020-01-02,5,1
B,2020-01-03,5,1
",
        );
        let result = DataPipeline::default().query(&records, 0).unwrap();
        let order: Vec<&str> = result.top_cases.iter().map(|t| t.location.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
        let order: Vec<&str> = result.top_deaths.iter().map(|t| t.location.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[test]
    fn unparsable_counts_fail_the_load() {
        for csv in [
            "location,date,new_cases,new_deaths\nA,2020-01-01,10,0\nA,2020-01-02,abc,0\n",
            "location,date,new_cases,new_deaths\nB,2020-01-03,5,xyz\n",
        ] {
            let err = DataPipeline::load_bytes(csv.as_bytes().to_vec(), &LoadOptions::default())
                .unwrap_err();
            assert!(matches!(err, LoadError::Csv(_)), "{csv:?} gave {err:?}");
        }
    }

    #[test]
    fn late_fractional_counts_are_kept() {
        let mut csv = String::from("location,date,new_cases,new_deaths\n");
        for _ in 0..10_001 {
            csv.push_str("A,2020-01-01,1,0\n");
        }
        csv.push_str("A,2020-02-01,2.5,0\n");

        let records = load(&csv);
        let result = DataPipeline::default().query(&records, 1).unwrap();
        assert_eq!(cases(&result, "A"), 10_003.5);
    }

    impl AggregateResult {
        fn with_cutoff(mut self, cutoff: i64) -> Self {
            self.cutoff = cutoff;
            self
        }
    }
}
