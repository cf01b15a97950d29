//! Case registry errors

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("a case named '{0}' already exists")]
    DuplicateName(String),

    #[error("no case named '{0}'")]
    NotFound(String),

    #[error("unknown design parameter '{0}'")]
    UnknownParameter(String),

    #[error("unknown performance metric '{0}'")]
    UnknownMetric(String),

    #[error("'{name}' must be a finite number, got {value}")]
    NonFiniteValue { name: String, value: f64 },

    #[error("case name must not be empty")]
    EmptyName,

    #[error("unknown case status '{0}', expected planned, running or completed")]
    InvalidStatus(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RegistryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RegistryError::Io {
            path: path.into(),
            source,
        }
    }
}
