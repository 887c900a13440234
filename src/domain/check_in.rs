//! Check-in aggregation: composite averages and day-bucketed running averages
//!
//! Both computations read the same time-ordered rating sequence:
//! - `composite()` averages every category over all records (neutral 5.0 when empty)
//! - `daily_series()` walks adjacent pairs and emits a cumulative running average
//!   each time the day changes, plus one closing point for the trailing day
//!
//! The running average at a boundary covers every record seen so far, not just
//! the day that ended. Sums are never reset.

use crate::domain::types::{Category, CompositeScore, DailyBucket, DailySeries, RatingRecord};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Deserialize;

/// Relative weight of each category in the check-in score
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub busy_weight: f64,
    pub line_weight: f64,
    pub hygiene_weight: f64,
    pub mask_weight: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self { busy_weight: 0.25, line_weight: 0.25, hygiene_weight: 0.25, mask_weight: 0.25 }
    }
}

impl ScoreWeights {
    pub fn weight(&self, category: Category) -> f64 {
        match category {
            Category::Busy => self.busy_weight,
            Category::Line => self.line_weight,
            Category::Hygiene => self.hygiene_weight,
            Category::Mask => self.mask_weight,
        }
    }

    /// Weighted sum of the composite averages
    pub fn apply(&self, composite: &CompositeScore) -> f64 {
        self.busy_weight * composite.busy
            + self.line_weight * composite.line
            + self.hygiene_weight * composite.hygiene
            + self.mask_weight * composite.mask
    }
}

/// How two consecutive check-ins are judged to fall on different days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayBoundary {
    /// Compare only the day of the week. Two Mondays in different weeks
    /// count as the same day.
    Weekday,
    /// Compare the full calendar date
    #[default]
    CalendarDate,
}

impl DayBoundary {
    #[inline]
    pub fn crosses(&self, current: DateTime<Utc>, next: DateTime<Utc>) -> bool {
        match self {
            DayBoundary::Weekday => current.weekday() != next.weekday(),
            DayBoundary::CalendarDate => current.date_naive() != next.date_naive(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayBoundary::Weekday => "weekday",
            DayBoundary::CalendarDate => "calendar_date",
        }
    }
}

/// Everything computed from a store's check-ins
#[derive(Debug, Clone, PartialEq)]
pub struct CheckInStats {
    pub composite: CompositeScore,
    /// Weighted check-in score
    pub score: f64,
    pub daily: DailySeries,
}

/// Cumulative per-category sums
#[derive(Debug, Default, Clone, Copy)]
struct CategorySums {
    busy: f64,
    line: f64,
    hygiene: f64,
    mask: f64,
}

impl CategorySums {
    #[inline]
    fn add(&mut self, record: &RatingRecord) {
        self.busy += record.busy;
        self.line += record.line;
        self.hygiene += record.hygiene;
        self.mask += record.mask;
    }

    #[inline]
    fn get(&self, category: Category) -> f64 {
        match category {
            Category::Busy => self.busy,
            Category::Line => self.line,
            Category::Hygiene => self.hygiene,
            Category::Mask => self.mask,
        }
    }
}

/// Pure aggregation over a rating sequence
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckInAggregator {
    weights: ScoreWeights,
    boundary: DayBoundary,
}

impl CheckInAggregator {
    pub fn new(weights: ScoreWeights, boundary: DayBoundary) -> Self {
        Self { weights, boundary }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn boundary(&self) -> DayBoundary {
        self.boundary
    }

    /// Composite score, weighted score and daily series in one pass each
    pub fn aggregate(&self, records: &[RatingRecord]) -> CheckInStats {
        let composite = self.composite(records);
        CheckInStats {
            score: self.weights.apply(&composite),
            composite,
            daily: self.daily_series(records),
        }
    }

    /// Average of each category; neutral placeholder when there are no records
    pub fn composite(&self, records: &[RatingRecord]) -> CompositeScore {
        if records.is_empty() {
            return CompositeScore::neutral();
        }

        let mut sums = CategorySums::default();
        for record in records {
            sums.add(record);
        }

        let count = records.len() as f64;
        CompositeScore {
            busy: sums.busy / count,
            line: sums.line / count,
            hygiene: sums.hygiene / count,
            mask: sums.mask / count,
            check_in_count: records.len() as u64,
        }
    }

    /// Running averages at each day boundary plus a closing point.
    ///
    /// `records` must be ordered by `submitted_at`. The closing point is always
    /// emitted, even when the last pair already produced a boundary point.
    pub fn daily_series(&self, records: &[RatingRecord]) -> DailySeries {
        let mut series = DailySeries::default();
        let Some(last) = records.last() else {
            return series;
        };

        let mut sums = CategorySums::default();
        for (i, pair) in records.windows(2).enumerate() {
            let (current, next) = (&pair[0], &pair[1]);
            sums.add(current);

            if self.boundary.crosses(current.submitted_at, next.submitted_at) {
                push_averages(&mut series, &sums, i + 1, current.day());
            }
        }

        sums.add(last);
        push_averages(&mut series, &sums, records.len(), last.day());

        series
    }
}

fn push_averages(series: &mut DailySeries, sums: &CategorySums, seen: usize, day: NaiveDate) {
    let seen = seen as f64;
    for category in Category::ALL {
        series.get_mut(category).push(DailyBucket {
            category,
            value: sums.get(category) / seen,
            day,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// 2020-07-06 is a Monday
    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 7, day, hour, 0, 0).unwrap()
    }

    fn record(value: f64, submitted_at: DateTime<Utc>) -> RatingRecord {
        RatingRecord { busy: value, line: value, hygiene: value, mask: value, submitted_at }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 7, day).unwrap()
    }

    #[test]
    fn test_empty_sequence_is_neutral() {
        let aggregator = CheckInAggregator::default();
        let stats = aggregator.aggregate(&[]);

        assert_eq!(stats.composite, CompositeScore::neutral());
        assert_eq!(stats.score, 5.0);
        assert!(stats.daily.is_empty());
    }

    #[test]
    fn test_constant_ratings_average_to_constant() {
        let aggregator = CheckInAggregator::default();
        let records: Vec<_> = (0..6).map(|i| record(7.5, at(6 + i / 2, 9))).collect();

        let stats = aggregator.aggregate(&records);
        assert_eq!(stats.composite.check_in_count, 6);
        assert_eq!(stats.score, 7.5);
        for category in Category::ALL {
            assert_eq!(stats.composite.value(category), 7.5);
            assert!(stats.daily.get(category).iter().all(|b| b.value == 7.5));
        }
    }

    #[test]
    fn test_composite_averages_each_category() {
        let aggregator = CheckInAggregator::default();
        let records = vec![
            RatingRecord { busy: 2.0, line: 4.0, hygiene: 6.0, mask: 8.0, submitted_at: at(6, 9) },
            RatingRecord { busy: 4.0, line: 6.0, hygiene: 8.0, mask: 10.0, submitted_at: at(6, 10) },
        ];

        let composite = aggregator.composite(&records);
        assert_eq!(composite.busy, 3.0);
        assert_eq!(composite.line, 5.0);
        assert_eq!(composite.hygiene, 7.0);
        assert_eq!(composite.mask, 9.0);
        assert_eq!(composite.check_in_count, 2);
        assert_eq!(aggregator.weights().apply(&composite), 6.0);
    }

    #[test]
    fn test_custom_weights() {
        let weights =
            ScoreWeights { busy_weight: 1.0, line_weight: 0.0, hygiene_weight: 0.0, mask_weight: 0.0 };
        let aggregator = CheckInAggregator::new(weights, DayBoundary::CalendarDate);
        let records = vec![RatingRecord {
            busy: 9.0,
            line: 1.0,
            hygiene: 1.0,
            mask: 1.0,
            submitted_at: at(6, 9),
        }];

        assert_eq!(aggregator.aggregate(&records).score, 9.0);
    }

    #[test]
    fn test_single_record_emits_one_point() {
        let aggregator = CheckInAggregator::default();
        let series = aggregator.daily_series(&[record(3.0, at(6, 9))]);

        for category in Category::ALL {
            let buckets = series.get(category);
            assert_eq!(buckets.len(), 1);
            assert_eq!(buckets[0].value, 3.0);
            assert_eq!(buckets[0].day, date(6));
            assert_eq!(buckets[0].category, category);
        }
    }

    #[test]
    fn test_mon_mon_tue_boundary() {
        let records = vec![record(2.0, at(6, 9)), record(4.0, at(6, 18)), record(9.0, at(7, 9))];

        for boundary in [DayBoundary::Weekday, DayBoundary::CalendarDate] {
            let aggregator = CheckInAggregator::new(ScoreWeights::default(), boundary);
            let series = aggregator.daily_series(&records);

            for category in Category::ALL {
                let buckets = series.get(category);
                assert_eq!(buckets.len(), 2);
                assert_eq!(buckets[0].value, 3.0);
                assert_eq!(buckets[0].day, date(6));
                assert_eq!(buckets[1].value, 5.0);
                assert_eq!(buckets[1].day, date(7));
            }
        }
    }

    #[test]
    fn test_closing_point_duplicates_last_boundary() {
        // Boundary between the last two records still gets a closing point
        let aggregator = CheckInAggregator::default();
        let records = vec![record(2.0, at(6, 9)), record(6.0, at(7, 9))];

        let buckets = aggregator.daily_series(&records).busy;
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].value, 2.0);
        assert_eq!(buckets[1].value, 4.0);
    }

    #[test]
    fn test_weekday_merges_same_weekday_in_different_weeks() {
        // Monday 6th and Monday 13th
        let records = vec![record(2.0, at(6, 9)), record(4.0, at(13, 9))];

        let weekday = CheckInAggregator::new(ScoreWeights::default(), DayBoundary::Weekday);
        assert_eq!(weekday.daily_series(&records).line.len(), 1);

        let calendar = CheckInAggregator::new(ScoreWeights::default(), DayBoundary::CalendarDate);
        let buckets = calendar.daily_series(&records).line;
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].day, date(6));
        assert_eq!(buckets[1].day, date(13));
    }

    #[test]
    fn test_running_average_is_not_reset() {
        let aggregator = CheckInAggregator::default();
        let records = vec![
            record(1.0, at(6, 9)),
            record(3.0, at(7, 9)),
            record(8.0, at(8, 9)),
        ];

        let values: Vec<f64> = aggregator.daily_series(&records).mask.iter().map(|b| b.value).collect();
        // boundary after 1 record, after 2 records, then closing over all 3
        assert_eq!(values, vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_day_boundary_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            boundary: DayBoundary,
        }
        let parsed: Wrapper = toml::from_str("boundary = \"weekday\"").unwrap();
        assert_eq!(parsed.boundary, DayBoundary::Weekday);
        assert_eq!(DayBoundary::default(), DayBoundary::CalendarDate);
    }
}
