//! Aggregator
//!
//! Groups joined rows by `(genre, year)` and reports the rounded mean rating.
//!
//! ## Partials
//!
//! Each partition keeps an exact `(sum, count)` per group. Partials are merged
//! first and the mean is rounded once, from the merged totals, so the result
//! does not depend on how rows were partitioned.
//!
//! ## Rounding
//!
//! The mean is rounded with integer arithmetic on `sum * 10^precision / count`,
//! so ties such as `1.00005` are detected exactly instead of through a binary
//! float. The default mode rounds ties away from zero.

use rayon::prelude::*;
use std::collections::HashMap;

use crate::config::{AggregationConfig, RoundingMode};
use crate::record::{AggregateResult, JoinedRow};

/// Largest supported precision; keeps `sum * 10^precision` inside `i128`.
pub const MAX_PRECISION: u32 = 18;

/// Exact running totals for one group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialAggregate {
    pub sum: i64,
    pub count: u64,
}

impl PartialAggregate {
    pub fn add(&mut self, rating: i32) {
        self.sum += i64::from(rating);
        self.count += 1;
    }

    pub fn merge(&mut self, other: &PartialAggregate) {
        self.sum += other.sum;
        self.count += other.count;
    }

    /// Rounded mean, or `None` for an empty group.
    pub fn mean(&self, precision: u32, mode: RoundingMode) -> Option<f64> {
        round_mean(self.sum, self.count, precision, mode)
    }
}

/// `round(sum / count, precision)` computed exactly.
///
/// `precision` is capped at [`MAX_PRECISION`]; configuration rejects larger
/// values before they reach this point.
pub fn round_mean(sum: i64, count: u64, precision: u32, mode: RoundingMode) -> Option<f64> {
    if count == 0 {
        return None;
    }
    let precision = precision.min(MAX_PRECISION);
    let scale = 10i128.pow(precision);
    let numerator = i128::from(sum) * scale;
    let denominator = i128::from(count);

    let magnitude = numerator.abs();
    let mut quotient = magnitude / denominator;
    let twice_remainder = (magnitude % denominator) * 2;

    let round_up = match twice_remainder.cmp(&denominator) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => match mode {
            RoundingMode::HalfAwayFromZero => true,
            RoundingMode::HalfEven => quotient % 2 == 1,
        },
    };
    if round_up {
        quotient += 1;
    }
    if numerator < 0 {
        quotient = -quotient;
    }
    Some(quotient as f64 / scale as f64)
}

/// Options for aggregation
#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    pub precision: u32,
    pub rounding: RoundingMode,
    pub parallel: bool,
    /// Inputs smaller than twice this are aggregated on the calling thread.
    /// 0 always partitions.
    pub min_rows_per_partition: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        AggregateOptions {
            precision: 4,
            rounding: RoundingMode::HalfAwayFromZero,
            parallel: false,
            min_rows_per_partition: 4096,
        }
    }
}

impl From<&AggregationConfig> for AggregateOptions {
    fn from(config: &AggregationConfig) -> Self {
        AggregateOptions {
            precision: config.precision,
            rounding: config.rounding,
            ..AggregateOptions::default()
        }
    }
}

type GroupKey = (String, i32);
type Partials = HashMap<GroupKey, PartialAggregate>;

/// Accumulate one partition of rows.
pub fn partial_aggregate(rows: &[JoinedRow]) -> Partials {
    let mut groups = Partials::new();
    for row in rows {
        groups
            .entry((row.genre.clone(), row.year))
            .or_default()
            .add(row.rating);
    }
    groups
}

/// Fold `other` into `into`.
pub fn merge_partials(mut into: Partials, other: Partials) -> Partials {
    for (key, partial) in other {
        into.entry(key).or_default().merge(&partial);
    }
    into
}

/// Turn merged partials into report rows ordered by year, then genre.
pub fn finalize(groups: Partials, precision: u32, mode: RoundingMode) -> Vec<AggregateResult> {
    let mut results: Vec<AggregateResult> = groups
        .into_iter()
        .filter_map(|((genre, year), partial)| {
            partial.mean(precision, mode).map(|avg_rating| AggregateResult {
                genre,
                year,
                avg_rating,
            })
        })
        .collect();
    results.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.genre.cmp(&b.genre)));
    results
}

/// Group by `(genre, year)`, average, round, and order by year ascending.
pub fn aggregate(rows: &[JoinedRow], options: &AggregateOptions) -> Vec<AggregateResult> {
    let groups = if options.parallel && rows.len() >= options.min_rows_per_partition * 2 {
        let chunk = options
            .min_rows_per_partition
            .max(rows.len() / rayon::current_num_threads().max(1))
            .max(1);
        rows.par_chunks(chunk)
            .map(partial_aggregate)
            .reduce(Partials::new, merge_partials)
    } else {
        partial_aggregate(rows)
    };
    finalize(groups, options.precision, options.rounding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(genre: &str, year: i32, rating: i32) -> JoinedRow {
        JoinedRow {
            genre: genre.to_string(),
            year,
            rating,
        }
    }

    #[test]
    fn test_mean_of_three_and_four() {
        let results = aggregate(
            &[row("Drama", 1995, 3), row("Drama", 1995, 4)],
            &AggregateOptions::default(),
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].avg_rating, 3.5);
    }

    #[test]
    fn test_round_to_four_digits() {
        // 10 / 3 = 3.33333...
        assert_eq!(
            round_mean(10, 3, 4, RoundingMode::HalfAwayFromZero),
            Some(3.3333)
        );
        // 5 / 3 = 1.66666...
        assert_eq!(
            round_mean(5, 3, 4, RoundingMode::HalfAwayFromZero),
            Some(1.6667)
        );
    }

    #[test]
    fn test_exact_tie_half_away_from_zero() {
        // 20001 / 20000 = 1.00005 exactly
        assert_eq!(
            round_mean(20001, 20000, 4, RoundingMode::HalfAwayFromZero),
            Some(1.0001)
        );
        // 60003 / 20000 = 3.00015 exactly
        assert_eq!(
            round_mean(60003, 20000, 4, RoundingMode::HalfAwayFromZero),
            Some(3.0002)
        );
    }

    #[test]
    fn test_exact_tie_half_even() {
        assert_eq!(round_mean(20001, 20000, 4, RoundingMode::HalfEven), Some(1.0));
        assert_eq!(round_mean(60003, 20000, 4, RoundingMode::HalfEven), Some(3.0002));
    }

    #[test]
    fn test_negative_tie() {
        assert_eq!(round_mean(-5, 2, 0, RoundingMode::HalfAwayFromZero), Some(-3.0));
        assert_eq!(round_mean(-5, 2, 0, RoundingMode::HalfEven), Some(-2.0));
    }

    #[test]
    fn test_empty_group_has_no_mean() {
        assert_eq!(round_mean(0, 0, 4, RoundingMode::HalfAwayFromZero), None);
        assert!(aggregate(&[], &AggregateOptions::default()).is_empty());
    }

    #[test]
    fn test_ordered_by_year() {
        let rows = vec![
            row("Comedy", 1999, 4),
            row("Action", 1991, 2),
            row("Comedy", 1995, 5),
            row("Action", 1995, 1),
        ];
        let results = aggregate(&rows, &AggregateOptions::default());
        let keys: Vec<_> = results.iter().map(|r| (r.year, r.genre.as_str())).collect();
        assert_eq!(
            keys,
            vec![
                (1991, "Action"),
                (1995, "Action"),
                (1995, "Comedy"),
                (1999, "Comedy"),
            ]
        );
    }

    #[test]
    fn test_parallel_rounds_once_after_merge() {
        // One 2 and 19999 ones: the true mean is 1.00005, which only rounds
        // to 1.0001 when computed from the merged totals.
        let mut rows = vec![row("Drama", 1996, 2)];
        rows.extend((0..19_999).map(|_| row("Drama", 1996, 1)));
        let options = AggregateOptions {
            parallel: true,
            min_rows_per_partition: 16,
            ..AggregateOptions::default()
        };
        let results = aggregate(&rows, &options);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].avg_rating, 1.0001);
        assert_eq!(results, aggregate(&rows, &AggregateOptions::default()));
    }

    #[test]
    fn test_parallel_with_zero_partition_size() {
        let options = AggregateOptions {
            parallel: true,
            min_rows_per_partition: 0,
            ..AggregateOptions::default()
        };
        assert!(aggregate(&[], &options).is_empty());

        // Fewer rows than worker threads
        let rows = vec![row("Animation", 1995, 5), row("Comedy", 1995, 4)];
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap();
        let results = pool.install(|| aggregate(&rows, &options));
        assert_eq!(results, aggregate(&rows, &AggregateOptions::default()));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_merge_partials() {
        let a = partial_aggregate(&[row("Drama", 1995, 3)]);
        let b = partial_aggregate(&[row("Drama", 1995, 4), row("War", 1995, 5)]);
        let merged = merge_partials(a, b);
        assert_eq!(
            merged[&("Drama".to_string(), 1995)],
            PartialAggregate { sum: 7, count: 2 }
        );
        assert_eq!(merged.len(), 2);
    }
}
