//! Predicate Filter
//!
//! Pure row predicates. Rows that fail are dropped, never flagged.

use crate::config::FilterConfig;
use crate::record::UserRecord;

/// A boolean test over one row.
pub trait RowPredicate<T: ?Sized> {
    fn keep(&self, row: &T) -> bool;
}

/// `year > min_exclusive`. A missing year never passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearFilter {
    pub min_exclusive: i32,
}

impl Default for YearFilter {
    fn default() -> Self {
        YearFilter {
            min_exclusive: 1989,
        }
    }
}

impl RowPredicate<Option<i32>> for YearFilter {
    fn keep(&self, year: &Option<i32>) -> bool {
        year.is_some_and(|y| y > self.min_exclusive)
    }
}

/// `min_exclusive < age_group < max_exclusive`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBandFilter {
    pub min_exclusive: i32,
    pub max_exclusive: i32,
}

impl Default for AgeBandFilter {
    fn default() -> Self {
        AgeBandFilter {
            min_exclusive: 1,
            max_exclusive: 50,
        }
    }
}

impl RowPredicate<UserRecord> for AgeBandFilter {
    fn keep(&self, user: &UserRecord) -> bool {
        user.age_group > self.min_exclusive && user.age_group < self.max_exclusive
    }
}

impl From<&FilterConfig> for YearFilter {
    fn from(config: &FilterConfig) -> Self {
        YearFilter {
            min_exclusive: config.min_year_exclusive,
        }
    }
}

impl From<&FilterConfig> for AgeBandFilter {
    fn from(config: &FilterConfig) -> Self {
        AgeBandFilter {
            min_exclusive: config.min_age_group_exclusive,
            max_exclusive: config.max_age_group_exclusive,
        }
    }
}

/// Copy out the rows `predicate` keeps, preserving order.
pub fn filter_rows<T, P>(rows: &[T], predicate: &P) -> Vec<T>
where
    T: Clone,
    P: RowPredicate<T>,
{
    rows.iter().filter(|r| predicate.keep(r)).cloned().collect()
}
