//! Error types for the insight pipeline
//!
//! Only whole-run failures live here. Individual malformed records are
//! skipped and counted by the loader, never surfaced as errors.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InsightError {
    /// No readable feed at the given location. Distinct from an empty feed.
    #[error("Conflict data not found: {0}")]
    DataNotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed feed {path}: {source}")]
    MalformedFeed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize {target}: {source}")]
    Serialize {
        target: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Corrupt novelty index {path}: {source}")]
    NoveltyIndex {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Detection window cannot be computed back from {0}")]
    DateWindow(NaiveDate),

    #[error("Detector {detector} failed: {reason}")]
    Detector { detector: String, reason: String },
}

impl InsightError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the caller should report "no data available" rather than a crash.
    pub fn is_data_not_found(&self) -> bool {
        matches!(self, Self::DataNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, InsightError>;
