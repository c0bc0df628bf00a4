//! Membership reconciliation: the detail source decides which titles exist.
//!
//! Matching aggregate records are left as they are unless
//! [`ReconcileOptions::refresh_existing`] is set.

use serde::Serialize;

use songbook_core::{DetailSource, OrphanPolicy, Record, Title};

use crate::diff::TitleDiff;
use crate::error::SyncError;
use crate::order::{check_order, SortCheck};

/// Knobs for [`reconcile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub orphans: OrphanPolicy,
    /// Replace matching aggregate records whose content drifted from detail.
    pub refresh_existing: bool,
}

/// Aggregate after membership correction, before sorting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    #[serde(skip)]
    pub records: Vec<Record>,
    pub added: Vec<Title>,
    pub removed: Vec<Title>,
    pub refreshed: Vec<Title>,
    /// Order of the aggregate after removals, before additions.
    pub order_before: SortCheck,
    pub changed: bool,
}

impl Reconciliation {
    pub fn membership_changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Bring `aggregate` in line with `detail`.
///
/// Aggregate-only records are dropped (or refused, per policy), detail-only
/// records are appended verbatim in title order. `changed` is also set when
/// the surviving records are out of order, since sorting alone must trigger
/// a rewrite.
pub fn reconcile(
    detail: &DetailSource,
    aggregate: Vec<Record>,
    diff: &TitleDiff,
    options: ReconcileOptions,
) -> Result<Reconciliation, SyncError> {
    if !diff.only_in_aggregate.is_empty() && options.orphans == OrphanPolicy::Refuse {
        return Err(SyncError::OrphanedRecords {
            titles: diff.only_in_aggregate.iter().cloned().collect(),
        });
    }

    let mut records: Vec<Record> = aggregate
        .into_iter()
        .filter(|record| !diff.only_in_aggregate.contains(&record.title_or_empty()))
        .collect();
    let removed: Vec<Title> = diff.only_in_aggregate.iter().cloned().collect();
    for title in &removed {
        tracing::info!("removing '{title}': no detail unit");
    }

    let order_before = check_order(&records);

    let mut refreshed = Vec::new();
    if options.refresh_existing {
        for record in records.iter_mut() {
            let Some(title) = record.title() else { continue };
            let Some(entry) = detail.get(&title) else { continue };
            if entry.record != *record {
                tracing::info!("refreshing '{title}' from {}", entry.path.display());
                *record = entry.record.clone();
                refreshed.push(title);
            }
        }
    }

    let mut added = Vec::new();
    for title in &diff.only_in_detail {
        let Some(entry) = detail.get(title) else { continue };
        tracing::info!("adding '{title}' from {}", entry.path.display());
        records.push(entry.record.clone());
        added.push(title.clone());
    }

    let changed =
        !added.is_empty() || !removed.is_empty() || !refreshed.is_empty() || !order_before.sorted;

    Ok(Reconciliation {
        records,
        added,
        removed,
        refreshed,
        order_before,
        changed,
    })
}
