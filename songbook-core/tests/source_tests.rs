//! Loader behavior against a realistic on-disk layout.

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use songbook_core::{
    config,
    source::{load_aggregate_at, load_detail_source_at},
    SourceError, SyncConfig, Title,
};

// ---------------------------------------------------------------------------
// 1. Layout resolved from config
// ---------------------------------------------------------------------------

#[test]
fn config_paths_resolve_against_root() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("songbook.yaml")
        .write_str("detail_dir: library/songs\naggregate: library/all.json\n")
        .expect("write config");
    root.child("library/songs/solar.json")
        .write_str(r#"{"Title":"Solar","Composer":"Miles Davis"}"#)
        .expect("write unit");
    root.child("library/all.json")
        .write_str(r#"[{"Title":"Solar","Composer":"Miles Davis"}]"#)
        .expect("write aggregate");

    let config = config::load_at(root.path()).expect("config");
    let detail = load_detail_source_at(&config.detail_dir_at(root.path()), &config.extension)
        .expect("detail");
    let aggregate = load_aggregate_at(&config.aggregate_at(root.path())).expect("aggregate");

    assert_eq!(detail.source.len(), 1);
    assert_eq!(aggregate.len(), 1);
    assert_eq!(aggregate[0].title(), Some(Title::from("Solar")));
}

#[test]
fn default_layout_matches_jazz_standards() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let config = SyncConfig::default();
    root.child("JazzStandards").create_dir_all().expect("mkdir");

    root.child("JazzStandards")
        .assert(predicate::path::is_dir());
    let detail = load_detail_source_at(&config.detail_dir_at(root.path()), &config.extension)
        .expect("detail");
    assert!(detail.source.is_empty());
    assert_eq!(detail.scanned, 0);
}

// ---------------------------------------------------------------------------
// 2. Non-ASCII content survives loading verbatim
// ---------------------------------------------------------------------------

#[test]
fn non_ascii_titles_load_verbatim() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("JazzStandards/desafinado.json")
        .write_str(r#"{"Title":"Desafinado","Composer":"Antônio Carlos Jobim"}"#)
        .expect("write unit");

    let detail = load_detail_source_at(&root.path().join("JazzStandards"), "json").expect("detail");
    let entry = detail.source.get(&Title::from("Desafinado")).expect("entry");
    assert_eq!(entry.record.0["Composer"], "Antônio Carlos Jobim");
}

// ---------------------------------------------------------------------------
// 3. Error messages carry the path
// ---------------------------------------------------------------------------

#[test]
fn parse_error_mentions_aggregate_path() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let aggregate = root.child("JazzStandards.json");
    aggregate.write_str("[{\"Title\": ").expect("write");

    let err = load_aggregate_at(aggregate.path()).unwrap_err();
    assert!(matches!(err, SourceError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("JazzStandards.json"));
}

#[test]
fn detail_dir_that_is_a_file_is_not_found() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let file = root.child("JazzStandards");
    file.write_str("not a directory").expect("write");

    let err = load_detail_source_at(file.path(), "json").unwrap_err();
    assert!(matches!(err, SourceError::DetailDirNotFound { .. }), "got: {err}");
}
