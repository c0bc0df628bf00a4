//! Songbook core library — record types, source loading, configuration.
//!
//! - [`types`] — `Title`, `Record`, `DetailSource`
//! - [`source`] — detail directory and aggregate file loaders
//! - [`config`] — `songbook.yaml`
//! - [`error`] — [`SourceError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod source;
pub mod types;

pub use config::{DuplicatePolicy, OrphanPolicy, SyncConfig};
pub use error::{ConfigError, SourceError};
pub use source::{DetailLoad, UnitIssue, UnitIssueKind};
pub use types::{DetailEntry, DetailSource, Record, Title, TITLE_FIELD};
