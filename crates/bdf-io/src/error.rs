//! Error types for bdf-io

use std::path::PathBuf;

use bdf_inp::InpError;
use bdf_model::ModelError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IoError>;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Inp(#[from] InpError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("include {}: {message}", path.display())]
    Include { path: PathBuf, message: String },

    /// A card that failed to construct in strict mode.
    #[error("{card} at line {line}: {source}")]
    Card {
        line: usize,
        card: String,
        #[source]
        source: ModelError,
    },
}

impl IoError {
    pub(crate) fn include(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        IoError::Include {
            path: path.into(),
            message: message.into(),
        }
    }
}
