//! # Pipeline Trace
//!
//! Row counts recorded after each stage of a run:
//! Load -> Derive/Filter -> Expand -> Join -> Aggregate
//!
//! Useful for seeing where rows drop out when a report comes back smaller
//! than expected.

use std::fmt;

use crate::parser::LoadStats;

/// Row counts for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageTrace {
    pub movies: LoadStats,
    pub users: LoadStats,
    pub ratings: LoadStats,

    /// Genre rows left after the year predicate and expansion
    pub normalized_movies: usize,

    /// Users inside the age band
    pub users_in_band: usize,

    /// Ratings that matched a kept user
    pub ratings_joined: usize,

    /// Rows that matched a kept movie genre row
    pub joined_rows: usize,

    /// Distinct `(genre, year)` groups
    pub groups: usize,
}

impl StageTrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records rejected across all three loads
    pub fn rejected(&self) -> usize {
        self.movies.rejected + self.users.rejected + self.ratings.rejected
    }

    /// Format the trace for display
    pub fn format_trace(&self) -> String {
        let mut output = String::new();
        output.push_str("PIPELINE TRACE\n");
        output.push_str("--------------\n");
        output.push_str(&format!(
            "  load:      movies={} users={} ratings={} (rejected {})\n",
            self.movies.parsed,
            self.users.parsed,
            self.ratings.parsed,
            self.rejected()
        ));
        output.push_str(&format!(
            "  filter:    genre_rows={} users_in_band={}\n",
            self.normalized_movies, self.users_in_band
        ));
        output.push_str(&format!(
            "  join:      ratings_joined={} joined_rows={}\n",
            self.ratings_joined, self.joined_rows
        ));
        output.push_str(&format!("  aggregate: groups={}\n", self.groups));
        output
    }
}

impl fmt::Display for StageTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_trace())
    }
}
