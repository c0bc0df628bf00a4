//! # songbook-sync
//!
//! Reconciliation of a detail directory against its aggregate file.
//!
//! Call [`pipeline::run`] with a [`RecordStore`] to diff, reconcile, sort,
//! persist and verify in one pass; [`pipeline::check`] and
//! [`pipeline::preview`] cover the read-only variants.

pub mod diff;
pub mod error;
pub mod order;
pub mod pipeline;
pub mod reconcile;
pub mod store;
pub mod writer;

pub use diff::{diff, unified_diff, TitleDiff};
pub use error::SyncError;
pub use order::{check_order, sort_records, OrderMismatch, SortCheck};
pub use pipeline::{
    CheckReport, Interrupt, Preview, SyncOptions, SyncReport, SyncState, Verification,
};
pub use reconcile::{reconcile, ReconcileOptions, Reconciliation};
pub use store::{FsStore, RecordStore};
pub use writer::WriteResult;
