//! Loading the two record sources from disk.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   JazzStandards/          detail directory, one `<name>.json` object per record
//!   JazzStandards.json      aggregate file, a JSON array of the same objects
//! ```
//!
//! Both loaders take explicit paths; nothing here depends on the process
//! working directory.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;

use crate::error::{io_err, SourceError};
use crate::types::{DetailEntry, DetailSource, Record, Title};

// ---------------------------------------------------------------------------
// 1. Unit issues
// ---------------------------------------------------------------------------

/// Why a detail unit was skipped or flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitIssueKind {
    /// The file could not be read.
    Unreadable { reason: String },
    /// The file is not valid JSON, or not a JSON object.
    Malformed { reason: String },
    /// The object has no string `Title` field.
    MissingTitle,
    /// Another unit already declared this title; this unit replaced it.
    DuplicateTitle { title: Title, replaced: PathBuf },
}

/// A non-fatal problem with a single detail unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitIssue {
    pub path: PathBuf,
    #[serde(flatten)]
    pub kind: UnitIssueKind,
}

impl UnitIssue {
    /// `true` when the unit was excluded from the detail source.
    pub fn is_skip(&self) -> bool {
        !matches!(self.kind, UnitIssueKind::DuplicateTitle { .. })
    }
}

impl fmt::Display for UnitIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display();
        match &self.kind {
            UnitIssueKind::Unreadable { reason } => write!(f, "{path}: unreadable ({reason})"),
            UnitIssueKind::Malformed { reason } => write!(f, "{path}: malformed ({reason})"),
            UnitIssueKind::MissingTitle => write!(f, "{path}: missing Title"),
            UnitIssueKind::DuplicateTitle { title, replaced } => write!(
                f,
                "{path}: duplicate Title '{title}' replaces {}",
                replaced.display()
            ),
        }
    }
}

/// Result of scanning the detail directory.
#[derive(Debug, Clone, Default)]
pub struct DetailLoad {
    pub source: DetailSource,
    /// Number of candidate units found, including skipped ones.
    pub scanned: usize,
    pub issues: Vec<UnitIssue>,
}

impl DetailLoad {
    pub fn duplicates(&self) -> impl Iterator<Item = &UnitIssue> {
        self.issues
            .iter()
            .filter(|issue| matches!(issue.kind, UnitIssueKind::DuplicateTitle { .. }))
    }
}

// ---------------------------------------------------------------------------
// 2. Detail source
// ---------------------------------------------------------------------------

/// Load every `*.<extension>` unit directly under `dir`.
///
/// Units are folded in ascending file-name order, so a duplicate title is
/// always resolved the same way: the later file wins and an issue is
/// recorded. Only a missing or unlistable directory is fatal.
pub fn load_detail_source_at(dir: &Path, extension: &str) -> Result<DetailLoad, SourceError> {
    if !dir.is_dir() {
        return Err(SourceError::DetailDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let units = list_units(dir, extension)?;
    tracing::debug!("scanning {} detail units in {}", units.len(), dir.display());

    let mut load = DetailLoad {
        scanned: units.len(),
        ..DetailLoad::default()
    };
    for (path, listed) in units {
        let record = match listed.and_then(|()| read_unit(&path)) {
            Ok(record) => record,
            Err(kind) => {
                tracing::warn!("skipping detail unit {}: {kind:?}", path.display());
                load.issues.push(UnitIssue { path, kind });
                continue;
            }
        };

        let Some(title) = record.title() else {
            tracing::warn!("missing Title in {}", path.display());
            load.issues.push(UnitIssue {
                path,
                kind: UnitIssueKind::MissingTitle,
            });
            continue;
        };

        let entry = DetailEntry {
            path: path.clone(),
            record,
        };
        if let Some(previous) = load.source.insert(title.clone(), entry) {
            tracing::warn!(
                "duplicate Title '{title}': {} replaces {}",
                path.display(),
                previous.path.display()
            );
            load.issues.push(UnitIssue {
                path,
                kind: UnitIssueKind::DuplicateTitle {
                    title,
                    replaced: previous.path,
                },
            });
        }
    }

    Ok(load)
}

/// Candidate units sorted by path. Symlinks are followed; an entry whose
/// metadata cannot be read stays in the list with its error so it is reported.
fn list_units(
    dir: &Path,
    extension: &str,
) -> Result<Vec<(PathBuf, Result<(), UnitIssueKind>)>, SourceError> {
    let mut units = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                units.push((dir.to_path_buf(), Err(unreadable(&e))));
                continue;
            }
        };
        if !path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        {
            continue;
        }
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => units.push((path, Ok(()))),
            Ok(_) => {}
            Err(e) => units.push((path, Err(unreadable(&e)))),
        }
    }
    units.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(units)
}

fn unreadable(e: &std::io::Error) -> UnitIssueKind {
    UnitIssueKind::Unreadable {
        reason: e.to_string(),
    }
}

fn read_unit(path: &Path) -> Result<Record, UnitIssueKind> {
    let contents = std::fs::read_to_string(path).map_err(|e| unreadable(&e))?;
    let value: Value = serde_json::from_str(&contents).map_err(|e| UnitIssueKind::Malformed {
        reason: e.to_string(),
    })?;
    Record::from_value(value).ok_or_else(|| UnitIssueKind::Malformed {
        reason: "expected a JSON object".to_string(),
    })
}

// ---------------------------------------------------------------------------
// 3. Aggregate
// ---------------------------------------------------------------------------

/// Load the aggregate array from `path`.
///
/// Returns `AggregateNotFound` if absent, `Parse` on invalid JSON and
/// `MalformedAggregate` if the document is not an array of objects.
pub fn load_aggregate_at(path: &Path) -> Result<Vec<Record>, SourceError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(SourceError::AggregateNotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(io_err(path, e)),
    };
    parse_aggregate(path, &contents)
}

/// Parse aggregate text that was already read from `path`.
pub fn parse_aggregate(path: &Path, contents: &str) -> Result<Vec<Record>, SourceError> {
    let value: Value = serde_json::from_str(contents).map_err(|e| SourceError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;

    let Value::Array(items) = value else {
        return Err(SourceError::MalformedAggregate {
            path: path.to_path_buf(),
            reason: format!("expected an array, got {}", json_kind(&value)),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let kind = json_kind(&item);
            Record::from_value(item).ok_or_else(|| SourceError::MalformedAggregate {
                path: path.to_path_buf(),
                reason: format!("element {index} is {kind}, expected an object"),
            })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).expect("write unit");
        path
    }

    #[test]
    fn missing_detail_dir_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = load_detail_source_at(&tmp.path().join("nope"), "json").unwrap_err();
        assert!(matches!(err, SourceError::DetailDirNotFound { .. }), "got: {err}");
    }

    #[test]
    fn loads_only_matching_extension() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "solar.json", r#"{"Title":"Solar"}"#);
        write(tmp.path(), "notes.txt", r#"{"Title":"Not A Song"}"#);
        fs::create_dir(tmp.path().join("nested.json")).unwrap();

        let load = load_detail_source_at(tmp.path(), "json").unwrap();
        assert_eq!(load.scanned, 1);
        assert_eq!(load.source.len(), 1);
        assert!(load.source.contains(&Title::from("Solar")));
        assert!(load.issues.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn symlinked_units_are_followed() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().unwrap();
        let shelf = tmp.path().join("shelf");
        let detail = tmp.path().join("detail");
        fs::create_dir_all(&shelf).unwrap();
        fs::create_dir_all(&detail).unwrap();
        let target = write(&shelf, "solar.txt", r#"{"Title":"Solar"}"#);
        symlink(&target, detail.join("solar.json")).unwrap();

        let load = load_detail_source_at(&detail, "json").unwrap();
        assert_eq!(load.scanned, 1);
        assert!(load.source.contains(&Title::from("Solar")));
        assert!(load.issues.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn dangling_symlink_is_reported_unreadable() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().unwrap();
        let link = tmp.path().join("gone.json");
        symlink(tmp.path().join("missing.txt"), &link).unwrap();
        write(tmp.path(), "oleo.json", r#"{"Title":"Oleo"}"#);

        let load = load_detail_source_at(tmp.path(), "json").unwrap();
        assert_eq!(load.scanned, 2);
        assert_eq!(load.source.len(), 1);
        assert_eq!(load.issues.len(), 1);
        assert_eq!(load.issues[0].path, link);
        assert!(matches!(load.issues[0].kind, UnitIssueKind::Unreadable { .. }));
    }

    #[rstest]
    #[case::invalid_json("{ not json", "malformed")]
    #[case::array("[1, 2]", "malformed")]
    #[case::no_title(r#"{"Composer":"Sonny Rollins"}"#, "missing_title")]
    #[case::numeric_title(r#"{"Title": 7}"#, "missing_title")]
    #[case::empty_object("{}", "missing_title")]
    fn bad_units_are_skipped_with_issue(#[case] contents: &str, #[case] expected: &str) {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "good.json", r#"{"Title":"Airegin"}"#);
        let bad = write(tmp.path(), "bad.json", contents);

        let load = load_detail_source_at(tmp.path(), "json").unwrap();
        assert_eq!(load.source.len(), 1);
        assert_eq!(load.issues.len(), 1);
        let issue = &load.issues[0];
        assert_eq!(issue.path, bad);
        assert!(issue.is_skip());
        let kind = serde_json::to_value(&issue.kind).unwrap();
        assert_eq!(kind["kind"], expected);
    }

    #[test]
    fn duplicate_titles_resolve_by_file_name_and_are_reported() {
        let tmp = TempDir::new().unwrap();
        let first = write(tmp.path(), "a.json", r#"{"Title":"Solar","Key":"C-"}"#);
        let second = write(tmp.path(), "b.json", r#"{"Title":"Solar","Key":"D-"}"#);

        let load = load_detail_source_at(tmp.path(), "json").unwrap();
        assert_eq!(load.source.len(), 1);
        let entry = load.source.get(&Title::from("Solar")).unwrap();
        assert_eq!(entry.path, second);
        assert_eq!(entry.record.0["Key"], "D-");

        let duplicates: Vec<_> = load.duplicates().collect();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(
            duplicates[0].kind,
            UnitIssueKind::DuplicateTitle {
                title: Title::from("Solar"),
                replaced: first,
            }
        );
        assert!(!duplicates[0].is_skip());
    }

    #[test]
    fn missing_aggregate_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = load_aggregate_at(&tmp.path().join("JazzStandards.json")).unwrap_err();
        assert!(matches!(err, SourceError::AggregateNotFound { .. }), "got: {err}");
        assert!(err.to_string().contains("JazzStandards.json"));
    }

    #[rstest]
    #[case::object(r#"{"Title":"Solar"}"#, "expected an array, got an object")]
    #[case::scalar_element(r#"[{"Title":"Solar"}, 3]"#, "element 1 is a number")]
    fn non_sequence_aggregate_is_malformed(#[case] contents: &str, #[case] fragment: &str) {
        let err = parse_aggregate(Path::new("agg.json"), contents).unwrap_err();
        match err {
            SourceError::MalformedAggregate { reason, .. } => {
                assert!(reason.contains(fragment), "reason: {reason}")
            }
            other => panic!("expected malformed aggregate, got {other:?}"),
        }
    }

    #[test]
    fn invalid_aggregate_json_is_parse_error() {
        let err = parse_aggregate(Path::new("agg.json"), "[{").unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }), "got: {err}");
    }

    #[test]
    fn aggregate_keeps_untitled_records() {
        let records =
            parse_aggregate(Path::new("agg.json"), r#"[{"Title":"Solar"}, {"Key":"F"}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].title().is_none());
    }
}
