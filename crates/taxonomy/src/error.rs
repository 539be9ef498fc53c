// ABOUTME: Error types for loading taxonomy and varietal reference data.
// ABOUTME: Provides TaxonomyError with Io, Json, and Shape variants plus convenience constructors.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading reference data.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    /// The data file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The data is not valid JSON.
    #[error("failed to parse reference data: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON parsed but a node does not have the expected structure.
    #[error("unexpected shape at {path}: expected {expected}")]
    Shape { path: String, expected: String },
}

impl TaxonomyError {
    /// Creates a Shape error for the node at `path`.
    pub fn shape(path: impl fmt::Display, expected: impl Into<String>) -> Self {
        TaxonomyError::Shape {
            path: path.to_string(),
            expected: expected.into(),
        }
    }

    /// Creates an Io error for a file that failed to load.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TaxonomyError::Io {
            path: path.into(),
            source,
        }
    }
}
