//! Pipeline context and orchestration
//!
//! A [`PipelineContext`] owns everything a run needs: the configuration and a
//! scoped worker pool. It is created at the start of a run and released when
//! dropped; there is no process-wide state.
//!
//! ```text
//! movies  -> parse -> derive year -> year filter -> expand genres --+
//! users   -> parse -> age band filter --+                           |
//! ratings -> parse ---------------------+-> join(user_id) ----------+-> join(movie_id)
//!                                                                        |
//!                                   aggregate(genre, year) <-------------+
//! ```

use std::time::Instant;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, info_span};

use crate::aggregate::{aggregate, AggregateOptions};
use crate::config::Config;
use crate::derive::{normalize_movies, NormalizeOptions};
use crate::error::{PipelineError, PipelineResult};
use crate::filter::{filter_rows, AgeBandFilter, YearFilter};
use crate::join::{join_ratings_with_users, join_with_movies, JoinOptions};
use crate::parser::{load_dataset, LoadStats, ParseOptions};
use crate::pipeline_trace::StageTrace;
use crate::record::{AggregateResult, MovieRecord, RatingRecord, UserRecord};

/// The three fully-typed input datasets
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    pub movies: Vec<MovieRecord>,
    pub users: Vec<UserRecord>,
    pub ratings: Vec<RatingRecord>,
}

/// Load counters that travel with the inputs into the trace
#[derive(Debug, Clone, Copy, Default)]
pub struct InputStats {
    pub movies: LoadStats,
    pub users: LoadStats,
    pub ratings: LoadStats,
}

/// Output of one run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Groups ordered by year ascending
    pub rows: Vec<AggregateResult>,
    pub trace: StageTrace,
}

/// Scoped execution context for a single run.
pub struct PipelineContext {
    config: Config,
    pool: ThreadPool,
    started: Instant,
}

impl PipelineContext {
    pub fn new(config: Config) -> PipelineResult<Self> {
        let threads = if config.execution.parallel {
            config.worker_threads()
        } else {
            1
        };
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("genre-ratings-{i}"))
            .build()
            .map_err(|e| PipelineError::ThreadPool(e.to_string()))?;
        info!(threads, parallel = config.execution.parallel, "pipeline_context_started");
        Ok(PipelineContext {
            config,
            pool,
            started: Instant::now(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Load all three datasets from the configured paths.
    ///
    /// The first dataset that fails aborts the load.
    pub fn load_inputs(&self) -> PipelineResult<(PipelineInputs, InputStats)> {
        let sources = &self.config.sources;
        let options = ParseOptions::from_config(&sources.delimiter, &self.config.parser);

        let movies = load_dataset::<MovieRecord>(&sources.movies, &options)?;
        info!(path = %sources.movies.display(), records = movies.stats.parsed, "dataset_loaded");
        let users = load_dataset::<UserRecord>(&sources.users, &options)?;
        info!(path = %sources.users.display(), records = users.stats.parsed, "dataset_loaded");
        let ratings = load_dataset::<RatingRecord>(&sources.ratings, &options)?;
        info!(path = %sources.ratings.display(), records = ratings.stats.parsed, "dataset_loaded");

        let stats = InputStats {
            movies: movies.stats,
            users: users.stats,
            ratings: ratings.stats,
        };
        let inputs = PipelineInputs {
            movies: movies.records,
            users: users.records,
            ratings: ratings.records,
        };
        Ok((inputs, stats))
    }

    /// Load the configured sources and run the pipeline over them.
    pub fn run_from_sources(&self) -> PipelineResult<PipelineReport> {
        let (inputs, stats) = self.load_inputs()?;
        let mut report = self.run(&inputs);
        report.trace.movies = stats.movies;
        report.trace.users = stats.users;
        report.trace.ratings = stats.ratings;
        Ok(report)
    }

    /// Run every stage over in-memory inputs.
    ///
    /// Never fails: anomalies only make the report smaller.
    pub fn run(&self, inputs: &PipelineInputs) -> PipelineReport {
        self.pool.install(|| {
            let _span = info_span!("pipeline_run").entered();
            self.run_stages(inputs)
        })
    }

    fn run_stages(&self, inputs: &PipelineInputs) -> PipelineReport {
        let filters = &self.config.filters;
        let execution = &self.config.execution;
        let mut trace = StageTrace::new();
        trace.movies.parsed = inputs.movies.len();
        trace.users.parsed = inputs.users.len();
        trace.ratings.parsed = inputs.ratings.len();

        let normalized = normalize_movies(
            &inputs.movies,
            &NormalizeOptions {
                year_filter: YearFilter::from(filters),
                drop_empty_genres: filters.drop_empty_genres,
            },
        );
        trace.normalized_movies = normalized.len();

        let users = filter_rows(&inputs.users, &AgeBandFilter::from(filters));
        trace.users_in_band = users.len();
        debug!(
            genre_rows = trace.normalized_movies,
            users_in_band = trace.users_in_band,
            "filters_applied"
        );

        let join_options = JoinOptions {
            parallel: execution.parallel,
            min_rows_per_partition: execution.min_rows_per_partition,
        };
        let rated = join_ratings_with_users(&users, &inputs.ratings, &join_options);
        trace.ratings_joined = rated.len();
        let joined = join_with_movies(&rated, &normalized, &join_options);
        trace.joined_rows = joined.len();
        debug!(
            ratings_joined = trace.ratings_joined,
            joined_rows = trace.joined_rows,
            "joins_complete"
        );

        let aggregate_options = AggregateOptions {
            parallel: execution.parallel,
            min_rows_per_partition: execution.min_rows_per_partition,
            ..AggregateOptions::from(&self.config.aggregation)
        };
        let rows = aggregate(&joined, &aggregate_options);
        trace.groups = rows.len();

        info!(
            groups = trace.groups,
            joined_rows = trace.joined_rows,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "pipeline_complete"
        );
        PipelineReport { rows, trace }
    }
}

impl Drop for PipelineContext {
    fn drop(&mut self) {
        info!(
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "pipeline_context_released"
        );
    }
}
