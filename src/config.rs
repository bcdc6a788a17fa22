//! Configuration System
//!
//! Provides hierarchical configuration loading from:
//! - genre_ratings.toml (default configuration)
//! - genre_ratings.local.toml (git-ignored local overrides)
//! - Environment variables (GENRE_RATINGS_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # genre_ratings.toml
//! [sources]
//! movies = "/data/ml-1m/movies.dat"
//! users = "/data/ml-1m/users.dat"
//! ratings = "/data/ml-1m/ratings.dat"
//!
//! [parser]
//! policy = "lenient"
//!
//! [aggregation]
//! rounding = "half_even"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! GENRE_RATINGS_SOURCES__MOVIES=/custom/movies.dat
//! GENRE_RATINGS_EXECUTION__NUM_THREADS=4
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::aggregate::MAX_PRECISION;
use crate::schema::Dataset;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Input file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_movies_path")]
    pub movies: PathBuf,

    #[serde(default = "default_users_path")]
    pub users: PathBuf,

    #[serde(default = "default_ratings_path")]
    pub ratings: PathBuf,

    /// Literal field separator shared by all three files
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl SourcesConfig {
    pub fn path_for(&self, dataset: Dataset) -> &Path {
        match dataset {
            Dataset::Movies => &self.movies,
            Dataset::Users => &self.users,
            Dataset::Ratings => &self.ratings,
        }
    }
}

/// How schema violations are handled during a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoadPolicy {
    /// Any bad record fails the dataset load
    #[default]
    Strict,
    /// Bad records are dropped with a warning
    Lenient,
}

/// Record parser settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default)]
    pub policy: LoadPolicy,

    #[serde(default = "default_true")]
    pub skip_blank_lines: bool,
}

/// Row predicate thresholds. All bounds are exclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Movies must be released strictly after this year
    #[serde(default = "default_min_year")]
    pub min_year_exclusive: i32,

    #[serde(default = "default_min_age_group")]
    pub min_age_group_exclusive: i32,

    #[serde(default = "default_max_age_group")]
    pub max_age_group_exclusive: i32,

    /// Drop the single empty token produced by an empty genre field
    #[serde(default)]
    pub drop_empty_genres: bool,
}

/// Rounding mode applied to the final mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Ties round away from zero (2.5 -> 3)
    #[default]
    HalfAwayFromZero,
    /// Ties round to the even neighbour (2.5 -> 2)
    HalfEven,
}

/// Aggregation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Fractional digits kept in `avg_rating`, at most 18
    #[serde(default = "default_precision")]
    pub precision: u32,

    #[serde(default)]
    pub rounding: RoundingMode,
}

/// Execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Partition joins and aggregation across worker threads
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Number of worker threads. 0 = use all available CPU cores
    #[serde(default)]
    pub num_threads: usize,

    /// Inputs smaller than this are processed on one thread. 0 = always
    /// partition
    #[serde(default = "default_min_rows_per_partition")]
    pub min_rows_per_partition: usize,
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// Presentation settings for the binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Maximum rows shown. 0 = show all
    #[serde(default = "default_output_limit")]
    pub limit: usize,

    #[serde(default)]
    pub format: OutputFormat,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Write logs to this file instead of stderr
    #[serde(default)]
    pub file: Option<PathBuf>,
}

// Default value functions
fn default_movies_path() -> PathBuf {
    PathBuf::from("./data/movies.dat")
}
fn default_users_path() -> PathBuf {
    PathBuf::from("./data/users.dat")
}
fn default_ratings_path() -> PathBuf {
    PathBuf::from("./data/ratings.dat")
}
fn default_delimiter() -> String {
    "::".to_string()
}
fn default_true() -> bool {
    true
}
fn default_min_year() -> i32 {
    1989
}
fn default_min_age_group() -> i32 {
    1
}
fn default_max_age_group() -> i32 {
    50
}
fn default_precision() -> u32 {
    4
}
fn default_min_rows_per_partition() -> usize {
    4096
}
fn default_output_limit() -> usize {
    50
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Merges in order:
    /// 1. built-in defaults
    /// 2. genre_ratings.toml (base configuration)
    /// 3. genre_ratings.local.toml (local overrides, git-ignored)
    /// 4. Environment variables (GENRE_RATINGS_* prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("genre_ratings.toml"))
            .merge(Toml::file("genre_ratings.local.toml"))
            .merge(Env::prefixed("GENRE_RATINGS_").split("__"))
            .extract::<Config>()?
            .validated()
    }

    /// Load configuration from specific file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("GENRE_RATINGS_").split("__"))
            .extract::<Config>()?
            .validated()
    }

    /// Reject values that deserialize but cannot be honoured.
    fn validated(self) -> Result<Self, figment::Error> {
        if self.aggregation.precision > MAX_PRECISION {
            return Err(figment::Error::from(format!(
                "aggregation.precision = {} exceeds the maximum of {MAX_PRECISION}",
                self.aggregation.precision
            )));
        }
        Ok(self)
    }

    /// Resolved worker count (`num_threads = 0` means all cores)
    pub fn worker_threads(&self) -> usize {
        match self.execution.num_threads {
            0 => num_cpus::get(),
            n => n,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            movies: default_movies_path(),
            users: default_users_path(),
            ratings: default_ratings_path(),
            delimiter: default_delimiter(),
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            policy: LoadPolicy::Strict,
            skip_blank_lines: true,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            min_year_exclusive: default_min_year(),
            min_age_group_exclusive: default_min_age_group(),
            max_age_group_exclusive: default_max_age_group(),
            drop_empty_genres: false,
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        AggregationConfig {
            precision: default_precision(),
            rounding: RoundingMode::HalfAwayFromZero,
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            parallel: true,
            num_threads: 0, // 0 = use all available CPU cores
            min_rows_per_partition: default_min_rows_per_partition(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            limit: default_output_limit(),
            format: OutputFormat::Table,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}
