//! Aggregate rendering and atomic persistence.
//!
//! ## `atomic_write` protocol
//!
//! 1. Render the full record sequence (pretty JSON, trailing newline).
//! 2. SHA-256 hash the rendered bytes.
//! 3. Write to `<path>.songbook.tmp`.
//! 4. Rename to the final path (atomic on POSIX).
//! 5. On rename failure remove the tmp file; the original stays intact.
//!
//! A failed save never leaves a truncated aggregate behind.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use songbook_core::Record;

use crate::error::{io_err, SyncError};

/// Outcome of persisting the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteResult {
    /// The aggregate was rewritten; `digest` is the SHA-256 of the new bytes.
    Written { path: PathBuf, digest: String },
    /// Nothing needed to change, so nothing was written.
    Unchanged { path: PathBuf },
    /// `--dry-run` mode: the aggregate *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path, .. }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }

    pub fn digest(&self) -> Option<&str> {
        match self {
            WriteResult::Written { digest, .. } => Some(digest),
            _ => None,
        }
    }
}

/// Render records exactly as they are persisted.
///
/// Two-space indentation, field order preserved, non-ASCII written as-is.
pub fn render_aggregate(records: &[Record]) -> Result<String, SyncError> {
    let mut rendered = serde_json::to_string_pretty(records)?;
    rendered.push('\n');
    Ok(rendered)
}

/// Hex SHA-256 of `bytes`.
pub fn digest(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// Atomically replace `path` with `content`, returning the content digest.
pub fn atomic_write(path: &Path, content: &str) -> Result<String, SyncError> {
    let tmp = tmp_path(path);
    atomic_write_with_tmp(path, content, &tmp)
}

/// `<path>.songbook.tmp`
pub fn tmp_path(path: &Path) -> PathBuf {
    PathBuf::from(format!("{}.songbook.tmp", path.display()))
}

fn atomic_write_with_tmp(path: &Path, content: &str, tmp: &Path) -> Result<String, SyncError> {
    let digest = digest(content.as_bytes());

    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    if let Err(e) = std::fs::write(tmp, content) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(tmp, e));
    }

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(digest)
}
