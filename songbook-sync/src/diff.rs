//! Title-set differences and unified text diffs.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use similar::TextDiff;

use songbook_core::{DetailSource, Record, Title};

/// Symmetric difference between detail and aggregate title sets.
///
/// Titles compare verbatim; case only matters for ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TitleDiff {
    /// Titles with a detail unit but no aggregate record.
    pub only_in_detail: BTreeSet<Title>,
    /// Titles with an aggregate record but no detail unit.
    pub only_in_aggregate: BTreeSet<Title>,
}

impl TitleDiff {
    pub fn is_empty(&self) -> bool {
        self.only_in_detail.is_empty() && self.only_in_aggregate.is_empty()
    }
}

/// Compute which titles exist on only one side.
pub fn diff(detail: &DetailSource, aggregate: &[Record]) -> TitleDiff {
    let aggregate_titles: HashSet<Title> = aggregate.iter().map(Record::title_or_empty).collect();

    let only_in_detail = detail
        .titles()
        .filter(|title| !aggregate_titles.contains(*title))
        .cloned()
        .collect();
    let only_in_aggregate = aggregate_titles
        .into_iter()
        .filter(|title| !detail.contains(title))
        .collect();

    TitleDiff {
        only_in_detail,
        only_in_aggregate,
    }
}

/// Unified diff of aggregate text, or an empty string when identical.
pub fn unified_diff(current: &str, proposed: &str, label: &str) -> String {
    let current = normalize_line_endings(current);
    let proposed = normalize_line_endings(proposed);
    if current == proposed {
        return String::new();
    }

    let old_header = format!("a/{label}");
    let new_header = format!("b/{label}");
    TextDiff::from_lines(&current, &proposed)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string()
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}
