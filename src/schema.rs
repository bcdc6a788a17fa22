//! Dataset schemas
//!
//! The three sources are headerless, so column meaning comes entirely from
//! position. Each dataset carries a fixed ordered list of fields:
//!
//! | Dataset | Columns |
//! |---------|---------|
//! | movies  | movie_id, movie_name, genre |
//! | users   | user_id, gender, age_group, occupation_id, zip_code |
//! | ratings | user_id, movie_id, rating, timestamp |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int32,
    Int64,
    Text,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Int32 => write!(f, "int32"),
            FieldType::Int64 => write!(f, "int64"),
            FieldType::Text => write!(f, "text"),
        }
    }
}

/// A named, typed column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}

impl FieldSpec {
    const fn new(name: &'static str, ty: FieldType) -> Self {
        FieldSpec { name, ty }
    }
}

const MOVIES: &[FieldSpec] = &[
    FieldSpec::new("movie_id", FieldType::Int32),
    FieldSpec::new("movie_name", FieldType::Text),
    FieldSpec::new("genre", FieldType::Text),
];

const USERS: &[FieldSpec] = &[
    FieldSpec::new("user_id", FieldType::Int32),
    FieldSpec::new("gender", FieldType::Text),
    FieldSpec::new("age_group", FieldType::Int32),
    FieldSpec::new("occupation_id", FieldType::Int32),
    FieldSpec::new("zip_code", FieldType::Int32),
];

const RATINGS: &[FieldSpec] = &[
    FieldSpec::new("user_id", FieldType::Int32),
    FieldSpec::new("movie_id", FieldType::Int32),
    FieldSpec::new("rating", FieldType::Int32),
    FieldSpec::new("timestamp", FieldType::Int64),
];

/// One of the three input datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Movies,
    Users,
    Ratings,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Movies, Dataset::Users, Dataset::Ratings];

    /// Ordered column list for this dataset
    pub fn schema(self) -> &'static [FieldSpec] {
        match self {
            Dataset::Movies => MOVIES,
            Dataset::Users => USERS,
            Dataset::Ratings => RATINGS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dataset::Movies => "movies",
            Dataset::Users => "users",
            Dataset::Ratings => "ratings",
        }
    }

    pub fn arity(self) -> usize {
        self.schema().len()
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
