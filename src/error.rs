//! Pipeline Error Types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::schema::Dataset;

/// Errors that abort a pipeline run.
///
/// A missing year, an empty genre or an empty join are not errors: they are
/// absorbed into the data model and only show up as a smaller report.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required input could not be opened or read
    #[error("{dataset} source unavailable at '{}': {source}", .path.display())]
    SourceUnavailable {
        dataset: Dataset,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A record does not match its dataset schema
    #[error("{dataset} line {line}: field '{field}' = {value:?}: {reason}")]
    SchemaViolation {
        dataset: Dataset,
        line: usize,
        field: &'static str,
        value: String,
        reason: String,
    },

    /// Configuration could not be extracted
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Worker pool construction failed
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

impl PipelineError {
    /// Dataset the error belongs to, if any.
    pub fn dataset(&self) -> Option<Dataset> {
        match self {
            PipelineError::SourceUnavailable { dataset, .. }
            | PipelineError::SchemaViolation { dataset, .. } => Some(*dataset),
            PipelineError::Config(_) | PipelineError::ThreadPool(_) => None,
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
