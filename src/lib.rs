//! # Genre Ratings
//!
//! Average movie ratings grouped by genre and release year, computed from
//! three headerless `::`-separated datasets (movies, users, ratings).
//!
//! ## Pipeline Architecture
//!
//! ```text
//! movies.dat / users.dat / ratings.dat
//!     ↓
//! [Record Parser]        → typed records (strict or lenient load)
//!     ↓
//! [Field Deriver]        → year from the "(YYYY)" title suffix
//! [Predicate Filter]     → year > 1989, 1 < age_group < 50
//! [Genre Normalizer]     → one row per genre token
//!     ↓
//! [Join Engine]          → users ⋈ ratings ⋈ movies (inner, hash)
//!     ↓
//! [Aggregator]           → round(avg(rating), 4) per (genre, year), by year
//!     ↓
//! Report
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use genre_ratings::{Config, PipelineContext};
//!
//! let config = Config::load()?;
//! let ctx = PipelineContext::new(config)?;
//! let report = ctx.run_from_sources()?;
//! for row in &report.rows {
//!     println!("{} {} {}", row.genre, row.year, row.avg_rating);
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `schema` | Dataset column layouts |
//! | `record` | Typed rows for every stage |
//! | `parser` | Delimited text → records |
//! | `derive` | Year extraction, genre expansion |
//! | `filter` | Row predicates |
//! | `join` | Inner hash equi-joins |
//! | `aggregate` | Grouped, exactly-rounded means |
//! | `pipeline` | Run context and stage orchestration |
//! | `report` | Table / JSON / CSV rendering |

pub mod aggregate;
pub mod config;
pub mod derive;
pub mod error;
pub mod filter;
pub mod join;
pub mod parser;
pub mod pipeline;
pub mod pipeline_trace;
pub mod record;
pub mod report;
pub mod schema;

pub use config::{Config, LoadPolicy, OutputFormat, RoundingMode};
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{PipelineContext, PipelineInputs, PipelineReport};
pub use pipeline_trace::StageTrace;
pub use record::{
    AggregateResult, JoinedRow, MovieRecord, NormalizedMovie, RatingRecord, UserRecord,
};
pub use schema::Dataset;
