//! `songbook.yaml` configuration.
//!
//! Every field is optional. A missing config file means defaults, which
//! match the classic JazzStandards layout:
//!
//! ```yaml
//! detail_dir: JazzStandards
//! aggregate: JazzStandards.json
//! extension: json
//! duplicates: warn      # warn | fail
//! orphans: remove       # remove | refuse
//! refresh_existing: false
//! ```
//!
//! Relative paths are resolved against the sync root, never against the
//! process working directory.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default config file name looked up under the sync root.
pub const CONFIG_FILE: &str = "songbook.yaml";

/// What to do when two detail units declare the same title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep the later unit (by file name) and report the collision.
    #[default]
    Warn,
    /// Abort the run.
    Fail,
}

/// What to do with aggregate records that have no detail unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanPolicy {
    /// Drop them from the aggregate and report each title.
    #[default]
    Remove,
    /// Abort the run without writing.
    Refuse,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "fail" => Ok(Self::Fail),
            other => Err(format!("unknown duplicate policy '{other}'; expected: warn, fail")),
        }
    }
}

impl FromStr for OrphanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "remove" => Ok(Self::Remove),
            "refuse" => Ok(Self::Refuse),
            other => Err(format!("unknown orphan policy '{other}'; expected: remove, refuse")),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Warn => write!(f, "warn"),
            DuplicatePolicy::Fail => write!(f, "fail"),
        }
    }
}

impl fmt::Display for OrphanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrphanPolicy::Remove => write!(f, "remove"),
            OrphanPolicy::Refuse => write!(f, "refuse"),
        }
    }
}

/// Sync configuration as written in `songbook.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    pub detail_dir: PathBuf,
    pub aggregate: PathBuf,
    pub extension: String,
    pub duplicates: DuplicatePolicy,
    pub orphans: OrphanPolicy,
    pub refresh_existing: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            detail_dir: PathBuf::from("JazzStandards"),
            aggregate: PathBuf::from("JazzStandards.json"),
            extension: "json".to_string(),
            duplicates: DuplicatePolicy::default(),
            orphans: OrphanPolicy::default(),
            refresh_existing: false,
        }
    }
}

impl SyncConfig {
    /// Detail directory resolved against `root`.
    pub fn detail_dir_at(&self, root: &Path) -> PathBuf {
        root.join(&self.detail_dir)
    }

    /// Aggregate file resolved against `root`.
    pub fn aggregate_at(&self, root: &Path) -> PathBuf {
        root.join(&self.aggregate)
    }
}

/// `<root>/songbook.yaml` — pure, no I/O.
pub fn config_path_at(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Load `<root>/songbook.yaml`, falling back to defaults when absent.
pub fn load_at(root: &Path) -> Result<SyncConfig, ConfigError> {
    let path = config_path_at(root);
    if !path.exists() {
        tracing::debug!("no config at {}, using defaults", path.display());
        return Ok(SyncConfig::default());
    }
    load_file(&path)
}

/// Load an explicitly named config file. A missing file is an error.
pub fn load_file(path: &Path) -> Result<SyncConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    if contents.trim().is_empty() {
        return Ok(SyncConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}
