//! Typed records for each pipeline stage
//!
//! Every stage produces a fresh `Vec` of one of these types; nothing is
//! mutated in place once it has been emitted.

use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};
use crate::schema::{Dataset, FieldType};

/// Raw movie row: `movie_id::movie_name::genre`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieRecord {
    pub movie_id: i32,
    pub movie_name: String,
    /// Pipe-delimited genre list, e.g. `Animation|Comedy`
    pub genre: String,
}

/// Raw user row: `user_id::gender::age_group::occupation_id::zip_code`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: i32,
    pub gender: String,
    pub age_group: i32,
    pub occupation_id: i32,
    pub zip_code: i32,
}

/// Raw rating row: `user_id::movie_id::rating::timestamp`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingRecord {
    pub user_id: i32,
    pub movie_id: i32,
    pub rating: i32,
    pub timestamp: i64,
}

/// A movie after year derivation and genre expansion (one row per genre)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMovie {
    pub movie_id: i32,
    pub genre: String,
    pub year: i32,
}

/// A rating that survived both joins, reduced to the aggregation inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRow {
    pub genre: String,
    pub year: i32,
    pub rating: i32,
}

/// One output row of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub genre: String,
    pub year: i32,
    pub avg_rating: f64,
}

/// Positional access to the fields of one input line, typed against the
/// dataset schema.
pub struct Fields<'a> {
    dataset: Dataset,
    line: usize,
    values: &'a [&'a str],
}

impl<'a> Fields<'a> {
    /// Wrap the split fields of `line`, checking the column count.
    pub fn new(dataset: Dataset, line: usize, values: &'a [&'a str]) -> PipelineResult<Self> {
        if values.len() != dataset.arity() {
            return Err(PipelineError::SchemaViolation {
                dataset,
                line,
                field: "<record>",
                value: values.join("|"),
                reason: format!(
                    "expected {} fields, found {}",
                    dataset.arity(),
                    values.len()
                ),
            });
        }
        Ok(Fields {
            dataset,
            line,
            values,
        })
    }

    pub fn text(&self, idx: usize) -> String {
        self.values[idx].to_string()
    }

    pub fn int32(&self, idx: usize) -> PipelineResult<i32> {
        debug_assert_eq!(self.dataset.schema()[idx].ty, FieldType::Int32);
        self.values[idx]
            .trim()
            .parse::<i32>()
            .map_err(|e| self.violation(idx, &e))
    }

    pub fn int64(&self, idx: usize) -> PipelineResult<i64> {
        debug_assert_eq!(self.dataset.schema()[idx].ty, FieldType::Int64);
        self.values[idx]
            .trim()
            .parse::<i64>()
            .map_err(|e| self.violation(idx, &e))
    }

    fn violation(&self, idx: usize, cause: &dyn std::fmt::Display) -> PipelineError {
        let spec = self.dataset.schema()[idx];
        PipelineError::SchemaViolation {
            dataset: self.dataset,
            line: self.line,
            field: spec.name,
            value: self.values[idx].to_string(),
            reason: format!("expected {}: {cause}", spec.ty),
        }
    }
}

/// Builds a typed record from one line's fields.
pub trait FromFields: Sized {
    const DATASET: Dataset;

    fn from_fields(fields: &Fields<'_>) -> PipelineResult<Self>;
}

impl FromFields for MovieRecord {
    const DATASET: Dataset = Dataset::Movies;

    fn from_fields(fields: &Fields<'_>) -> PipelineResult<Self> {
        Ok(MovieRecord {
            movie_id: fields.int32(0)?,
            movie_name: fields.text(1),
            genre: fields.text(2),
        })
    }
}

impl FromFields for UserRecord {
    const DATASET: Dataset = Dataset::Users;

    fn from_fields(fields: &Fields<'_>) -> PipelineResult<Self> {
        Ok(UserRecord {
            user_id: fields.int32(0)?,
            gender: fields.text(1),
            age_group: fields.int32(2)?,
            occupation_id: fields.int32(3)?,
            zip_code: fields.int32(4)?,
        })
    }
}

impl FromFields for RatingRecord {
    const DATASET: Dataset = Dataset::Ratings;

    fn from_fields(fields: &Fields<'_>) -> PipelineResult<Self> {
        Ok(RatingRecord {
            user_id: fields.int32(0)?,
            movie_id: fields.int32(1)?,
            rating: fields.int32(2)?,
            timestamp: fields.int64(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_fields() {
        let raw = ["10", "M", "25", "1", "11111"];
        let fields = Fields::new(Dataset::Users, 1, &raw).unwrap();
        let user = UserRecord::from_fields(&fields).unwrap();
        assert_eq!(user.user_id, 10);
        assert_eq!(user.age_group, 25);
        assert_eq!(user.zip_code, 11111);
    }

    #[test]
    fn test_wrong_arity_is_violation() {
        let raw = ["1", "Toy Story (1995)"];
        let err = Fields::new(Dataset::Movies, 3, &raw).err().unwrap();
        assert!(matches!(
            err,
            PipelineError::SchemaViolation { line: 3, field: "<record>", .. }
        ));
    }

    #[test]
    fn test_bad_integer_names_field() {
        let raw = ["1", "2", "x", "978300760"];
        let fields = Fields::new(Dataset::Ratings, 4, &raw).unwrap();
        match RatingRecord::from_fields(&fields) {
            Err(PipelineError::SchemaViolation { field, value, .. }) => {
                assert_eq!(field, "rating");
                assert_eq!(value, "x");
            }
            other => panic!("expected schema violation, got {other:?}"),
        }
    }

    #[test]
    fn test_integer_fields_trim_whitespace() {
        let raw = [" 1 ", "2", "3", " 978300760"];
        let fields = Fields::new(Dataset::Ratings, 1, &raw).unwrap();
        let rating = RatingRecord::from_fields(&fields).unwrap();
        assert_eq!(rating.user_id, 1);
        assert_eq!(rating.timestamp, 978300760);
    }
}
