//! Pre-processing errors

use std::path::PathBuf;

use thiserror::Error;

use crate::cache::ArtifactKey;

/// Pre-processing result type
pub type Result<T> = std::result::Result<T, PreprocessError>;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("input is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("column '{0}' appears more than once")]
    DuplicateColumn(String),

    #[error("column '{column}' has {actual} values, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("point {row} has a non-finite '{axis}' coordinate")]
    NonFiniteCoordinate { row: usize, axis: &'static str },

    #[error("point {row} has variables {found:?}, expected {expected:?}")]
    InconsistentVariables {
        row: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("row {row}: cannot parse '{value}' in column '{column}' as a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("point cloud contains no points")]
    EmptyPointCloud,

    #[error("unsupported input format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("artifact stored under {key} carries key {actual}")]
    KeyMismatch {
        key: ArtifactKey,
        actual: ArtifactKey,
    },

    #[error("variable '{0}' is not part of the dataset")]
    UnknownVariable(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("LAS error: {0}")]
    Las(#[from] las::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("artifact encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("DDS error: {0}")]
    Dds(#[from] ddsfile::Error),
}

impl PreprocessError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PreprocessError::Io {
            path: path.into(),
            source,
        }
    }
}
