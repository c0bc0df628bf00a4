//! Error types for songbook-sync.

use std::path::PathBuf;

use thiserror::Error;

use songbook_core::{SourceError, Title};

use crate::pipeline::SyncState;

/// All errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A source could not be loaded.
    #[error("load error: {0}")]
    Source(#[from] SourceError),

    /// An I/O error while persisting, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Aggregate serialization error.
    #[error("aggregate JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Duplicate detail titles under the `fail` policy.
    #[error("duplicate detail titles: {}", join_titles(.titles))]
    DuplicateTitles { titles: Vec<Title> },

    /// Aggregate-only records under the `refuse` policy.
    #[error("aggregate records without detail units: {}", join_titles(.titles))]
    OrphanedRecords { titles: Vec<Title> },

    /// The run was interrupted before entering `state`. `saved` is set when
    /// the aggregate had already been written.
    #[error("interrupted before {state}{}", saved_note(.saved))]
    Interrupted { state: SyncState, saved: bool },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

fn saved_note(saved: &bool) -> &'static str {
    if *saved {
        " (aggregate already written)"
    } else {
        ""
    }
}

fn join_titles(titles: &[Title]) -> String {
    titles
        .iter()
        .map(|t| format!("'{t}'"))
        .collect::<Vec<_>>()
        .join(", ")
}
