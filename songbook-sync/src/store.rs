//! Record stores: where the detail source and aggregate live.
//!
//! The pipeline only talks to [`RecordStore`], so the same orchestration
//! runs against the filesystem ([`FsStore`]) or an in-memory double in tests.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use songbook_core::{
    source::{self, DetailLoad},
    Record, SourceError, SyncConfig,
};

use crate::error::SyncError;
use crate::writer;

/// Load/persist boundary of a sync run.
pub trait RecordStore {
    /// Build the detail source fresh from persisted units.
    fn load_detail(&self) -> Result<DetailLoad, SyncError>;

    /// Load the aggregate sequence.
    fn load_aggregate(&self) -> Result<Vec<Record>, SyncError>;

    /// Current persisted aggregate text, exactly as stored.
    fn read_aggregate_text(&self) -> Result<String, SyncError>;

    /// Replace the aggregate as a whole. Returns the digest of what was written.
    fn save_aggregate(&self, records: &[Record]) -> Result<String, SyncError>;

    /// Digest of the aggregate as currently persisted.
    fn aggregate_digest(&self) -> Result<String, SyncError> {
        Ok(writer::digest(self.read_aggregate_text()?.as_bytes()))
    }

    /// Where the aggregate lives, for reporting.
    fn aggregate_location(&self) -> PathBuf;

    /// Where the detail units live, for reporting.
    fn detail_location(&self) -> PathBuf;
}

/// Filesystem-backed store with explicit paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsStore {
    pub detail_dir: PathBuf,
    pub aggregate: PathBuf,
    pub extension: String,
}

impl FsStore {
    pub fn new(
        detail_dir: impl Into<PathBuf>,
        aggregate: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            detail_dir: detail_dir.into(),
            aggregate: aggregate.into(),
            extension: extension.into(),
        }
    }

    /// Store laid out per `config`, rooted at `root`.
    pub fn from_config_at(root: &Path, config: &SyncConfig) -> Self {
        Self::new(
            config.detail_dir_at(root),
            config.aggregate_at(root),
            config.extension.clone(),
        )
    }
}

impl RecordStore for FsStore {
    fn load_detail(&self) -> Result<DetailLoad, SyncError> {
        Ok(source::load_detail_source_at(
            &self.detail_dir,
            &self.extension,
        )?)
    }

    fn load_aggregate(&self) -> Result<Vec<Record>, SyncError> {
        Ok(source::load_aggregate_at(&self.aggregate)?)
    }

    fn read_aggregate_text(&self) -> Result<String, SyncError> {
        std::fs::read_to_string(&self.aggregate).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SyncError::Source(SourceError::AggregateNotFound {
                path: self.aggregate.clone(),
            }),
            _ => crate::error::io_err(&self.aggregate, e),
        })
    }

    fn save_aggregate(&self, records: &[Record]) -> Result<String, SyncError> {
        let rendered = writer::render_aggregate(records)?;
        writer::atomic_write(&self.aggregate, &rendered)
    }

    fn aggregate_location(&self) -> PathBuf {
        self.aggregate.clone()
    }

    fn detail_location(&self) -> PathBuf {
        self.detail_dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn layout() -> (TempDir, FsStore) {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("JazzStandards")).unwrap();
        let store = FsStore::from_config_at(root.path(), &SyncConfig::default());
        (root, store)
    }

    #[test]
    fn save_then_digest_matches() {
        let (_root, store) = layout();
        let written = store
            .save_aggregate(&[Record::with_title("Solar")])
            .unwrap();
        assert_eq!(store.aggregate_digest().unwrap(), written);
        assert_eq!(store.load_aggregate().unwrap().len(), 1);
    }

    #[test]
    fn missing_aggregate_text_is_not_found() {
        let (_root, store) = layout();
        let err = store.read_aggregate_text().unwrap_err();
        assert!(
            matches!(err, SyncError::Source(SourceError::AggregateNotFound { .. })),
            "got: {err}"
        );
    }

    #[test]
    fn store_paths_follow_config() {
        let root = TempDir::new().unwrap();
        let config = SyncConfig {
            detail_dir: PathBuf::from("songs"),
            aggregate: PathBuf::from("index.json"),
            ..SyncConfig::default()
        };
        let store = FsStore::from_config_at(root.path(), &config);
        assert_eq!(store.detail_location(), root.path().join("songs"));
        assert_eq!(store.aggregate_location(), root.path().join("index.json"));
    }
}
