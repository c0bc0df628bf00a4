//! Error types for songbook-core.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while loading the detail or aggregate source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The detail directory does not exist or is not a directory.
    #[error("detail directory not found at {path}")]
    DetailDirNotFound { path: PathBuf },

    /// The aggregate file does not exist.
    #[error("aggregate file not found at {path}")]
    AggregateNotFound { path: PathBuf },

    /// Underlying I/O failure, with the path that caused it.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The aggregate file is not valid JSON.
    #[error("failed to parse aggregate at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The aggregate parsed but is not an array of objects.
    #[error("malformed aggregate at {path}: {reason}")]
    MalformedAggregate { path: PathBuf, reason: String },
}

/// Errors raised while loading `songbook.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, including line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// An explicitly requested config file does not exist.
    #[error("config file not found at {path}")]
    NotFound { path: PathBuf },
}

/// Convenience constructor for [`SourceError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SourceError {
    SourceError::Io {
        path: path.into(),
        source,
    }
}
