//! Sync orchestration shared by `songbook sync`, `check` and `diff`.
//!
//! ```text
//! Load -> Diff -> Reconcile -> (SortAndSave | NoOp) -> Verify -> Done
//! ```
//!
//! Only `Load`, `SortAndSave` and the policy checks can fail outright.
//! `Verify` reloads both sources from the store, so a bad save or a
//! reconciliation bug shows up as a failing [`Verification`] rather than
//! going unnoticed.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use songbook_core::{
    source::DetailLoad, DetailSource, DuplicatePolicy, Record, SyncConfig, Title, UnitIssue,
    UnitIssueKind,
};

use crate::diff::{diff, TitleDiff};
use crate::error::SyncError;
use crate::order::{check_order, sort_records, SortCheck};
use crate::reconcile::{reconcile, ReconcileOptions, Reconciliation};
use crate::store::RecordStore;
use crate::writer::{self, WriteResult};

// ---------------------------------------------------------------------------
// States and interruption
// ---------------------------------------------------------------------------

/// Orchestrator states, in the order a run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Load,
    Diff,
    Reconcile,
    SortAndSave,
    NoOp,
    Verify,
    Done,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::Load => "load",
            SyncState::Diff => "diff",
            SyncState::Reconcile => "reconcile",
            SyncState::SortAndSave => "sort-and-save",
            SyncState::NoOp => "no-op",
            SyncState::Verify => "verify",
            SyncState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Shared cancellation flag, raised from a signal handler.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Gate a transition into `next`.
    fn enter(&self, next: SyncState) -> Result<(), SyncError> {
        if self.is_raised() {
            tracing::warn!("interrupted before {next}");
            return Err(SyncError::Interrupted {
                state: next,
                saved: false,
            });
        }
        tracing::debug!("sync state -> {next}");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Options and reports
// ---------------------------------------------------------------------------

/// Per-run settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Compute everything but never write.
    pub dry_run: bool,
    pub duplicates: DuplicatePolicy,
    pub reconcile: ReconcileOptions,
}

impl SyncOptions {
    pub fn from_config(config: &SyncConfig, dry_run: bool) -> Self {
        Self {
            dry_run,
            duplicates: config.duplicates,
            reconcile: ReconcileOptions {
                orphans: config.orphans,
                refresh_existing: config.refresh_existing,
            },
        }
    }
}

/// End-state consistency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub detail_count: usize,
    pub aggregate_count: usize,
    pub diff: TitleDiff,
    pub order: SortCheck,
    /// Persisted bytes hash to what was written (always true without a write).
    pub persisted_intact: bool,
}

impl Verification {
    fn compute(detail: &DetailSource, aggregate: &[Record], persisted_intact: bool) -> Self {
        Self {
            detail_count: detail.len(),
            aggregate_count: aggregate.len(),
            diff: diff(detail, aggregate),
            order: check_order(aggregate),
            persisted_intact,
        }
    }

    pub fn synced(&self) -> bool {
        self.diff.is_empty() && self.persisted_intact
    }

    pub fn sorted(&self) -> bool {
        self.order.sorted
    }

    pub fn is_success(&self) -> bool {
        self.synced() && self.sorted()
    }
}

/// Everything a sync run did, in reportable form.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub detail_dir: PathBuf,
    pub aggregate_path: PathBuf,
    /// Candidate detail units found, including skipped ones.
    pub detail_scanned: usize,
    pub detail_count: usize,
    /// Aggregate size as loaded, before reconciliation.
    pub aggregate_count: usize,
    pub issues: Vec<UnitIssue>,
    pub initial_diff: TitleDiff,
    /// `records` holds the final aggregate sequence.
    pub reconciliation: Reconciliation,
    pub write: WriteResult,
    pub verification: Verification,
}

impl SyncReport {
    /// `(synced, sorted)`; the run succeeded iff both are true.
    pub fn outcome(&self) -> (bool, bool) {
        (self.verification.synced(), self.verification.sorted())
    }

    pub fn changed(&self) -> bool {
        self.reconciliation.changed
    }

    pub fn is_success(&self) -> bool {
        self.verification.is_success()
    }
}

/// Result of a verify-only pass.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub detail_scanned: usize,
    pub issues: Vec<UnitIssue>,
    pub verification: Verification,
}

/// Aggregate text as stored and as sync would write it.
#[derive(Debug, Clone)]
pub struct Preview {
    pub aggregate_path: PathBuf,
    pub current: String,
    pub proposed: String,
    pub reconciliation: Reconciliation,
}

impl Preview {
    pub fn changed(&self) -> bool {
        self.reconciliation.changed
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

struct Plan {
    detail: DetailLoad,
    aggregate_count: usize,
    initial_diff: TitleDiff,
    reconciliation: Reconciliation,
}

/// Load → Diff → Reconcile, then sort when anything changed.
fn plan<S: RecordStore + ?Sized>(
    store: &S,
    options: &SyncOptions,
    interrupt: &Interrupt,
) -> Result<Plan, SyncError> {
    interrupt.enter(SyncState::Load)?;
    let detail = store.load_detail()?;
    let aggregate = store.load_aggregate()?;
    tracing::info!(
        "loaded {} detail records ({} units) and {} aggregate records",
        detail.source.len(),
        detail.scanned,
        aggregate.len()
    );

    if options.duplicates == DuplicatePolicy::Fail {
        let titles: Vec<Title> = detail
            .duplicates()
            .filter_map(|issue| match &issue.kind {
                UnitIssueKind::DuplicateTitle { title, .. } => Some(title.clone()),
                _ => None,
            })
            .collect();
        if !titles.is_empty() {
            return Err(SyncError::DuplicateTitles { titles });
        }
    }

    interrupt.enter(SyncState::Diff)?;
    let aggregate_count = aggregate.len();
    let initial_diff = diff(&detail.source, &aggregate);

    interrupt.enter(SyncState::Reconcile)?;
    let mut reconciliation = reconcile(&detail.source, aggregate, &initial_diff, options.reconcile)?;
    if reconciliation.changed {
        reconciliation.records = sort_records(std::mem::take(&mut reconciliation.records));
    }

    Ok(Plan {
        detail,
        aggregate_count,
        initial_diff,
        reconciliation,
    })
}

/// Run a full sync against `store`.
///
/// Returns `Err` only for fatal conditions. A run that completes but leaves
/// the sources out of sync or unsorted returns `Ok` with a failing
/// [`SyncReport::outcome`].
pub fn run<S: RecordStore + ?Sized>(
    store: &S,
    options: &SyncOptions,
    interrupt: &Interrupt,
) -> Result<SyncReport, SyncError> {
    let started_at = Utc::now();
    let Plan {
        detail,
        aggregate_count,
        initial_diff,
        reconciliation,
    } = plan(store, options, interrupt)?;

    let aggregate_path = store.aggregate_location();
    let write = if reconciliation.changed {
        interrupt.enter(SyncState::SortAndSave)?;
        if options.dry_run {
            tracing::info!("[dry-run] would write: {}", aggregate_path.display());
            WriteResult::WouldWrite {
                path: aggregate_path.clone(),
            }
        } else {
            let digest = store.save_aggregate(&reconciliation.records)?;
            WriteResult::Written {
                path: aggregate_path.clone(),
                digest,
            }
        }
    } else {
        interrupt.enter(SyncState::NoOp)?;
        tracing::debug!("unchanged: {}", aggregate_path.display());
        WriteResult::Unchanged {
            path: aggregate_path.clone(),
        }
    };

    let saved = matches!(write, WriteResult::Written { .. });
    interrupt
        .enter(SyncState::Verify)
        .map_err(|err| match err {
            SyncError::Interrupted { state, .. } => SyncError::Interrupted { state, saved },
            other => other,
        })?;
    let verification = if options.dry_run {
        Verification::compute(&detail.source, &reconciliation.records, true)
    } else {
        verify(store, write.digest())?
    };
    if !verification.is_success() {
        tracing::warn!(
            "verification failed: synced={} sorted={}",
            verification.synced(),
            verification.sorted()
        );
    }
    tracing::debug!("sync state -> {}", SyncState::Done);

    Ok(SyncReport {
        started_at,
        finished_at: Utc::now(),
        dry_run: options.dry_run,
        detail_dir: store.detail_location(),
        aggregate_path,
        detail_scanned: detail.scanned,
        detail_count: detail.source.len(),
        aggregate_count,
        issues: detail.issues,
        initial_diff,
        reconciliation,
        write,
        verification,
    })
}

/// Reload both sources and check the end state.
fn verify<S: RecordStore + ?Sized>(
    store: &S,
    written_digest: Option<&str>,
) -> Result<Verification, SyncError> {
    let detail = store.load_detail()?;
    let aggregate = store.load_aggregate()?;
    let persisted_intact = match written_digest {
        Some(expected) => {
            let actual = store.aggregate_digest()?;
            if actual != expected {
                tracing::warn!("persisted aggregate digest {actual} != written {expected}");
            }
            actual == expected
        }
        None => true,
    };
    Ok(Verification::compute(
        &detail.source,
        &aggregate,
        persisted_intact,
    ))
}

/// Verify-only pass: no reconciliation, no writes.
pub fn check<S: RecordStore + ?Sized>(store: &S) -> Result<CheckReport, SyncError> {
    let detail = store.load_detail()?;
    let aggregate = store.load_aggregate()?;
    Ok(CheckReport {
        detail_scanned: detail.scanned,
        verification: Verification::compute(&detail.source, &aggregate, true),
        issues: detail.issues,
    })
}

/// Render the aggregate as it is now and as a sync would leave it.
pub fn preview<S: RecordStore + ?Sized>(
    store: &S,
    options: &SyncOptions,
) -> Result<Preview, SyncError> {
    let plan = plan(store, options, &Interrupt::new())?;
    let current = store.read_aggregate_text()?;
    let proposed = if plan.reconciliation.changed {
        writer::render_aggregate(&plan.reconciliation.records)?
    } else {
        current.clone()
    };
    Ok(Preview {
        aggregate_path: store.aggregate_location(),
        current,
        proposed,
        reconciliation: plan.reconciliation,
    })
}
