//! Console and JSON rendering of sync/check reports.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use songbook_core::{Title, UnitIssue};
use songbook_sync::{CheckReport, SortCheck, SyncReport, Verification, WriteResult};

#[derive(Serialize)]
struct SyncJson<'a> {
    synced: bool,
    sorted: bool,
    changed: bool,
    #[serde(flatten)]
    report: &'a SyncReport,
}

#[derive(Serialize)]
struct CheckJson<'a> {
    synced: bool,
    sorted: bool,
    #[serde(flatten)]
    report: &'a CheckReport,
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "source")]
    source: String,
    #[tabled(rename = "records")]
    records: usize,
}

// ---------------------------------------------------------------------------
// sync
// ---------------------------------------------------------------------------

pub fn print_sync_json(report: &SyncReport) -> Result<()> {
    let (synced, sorted) = report.outcome();
    let payload = SyncJson {
        synced,
        sorted,
        changed: report.changed(),
        report,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize sync report")?
    );
    Ok(())
}

pub fn print_sync(report: &SyncReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    println!("{}", format!("{prefix}songbook sync").bold());
    println!(
        "  detail:    {} records from {} ({} files)",
        report.detail_count,
        report.detail_dir.display(),
        report.detail_scanned
    );
    println!(
        "  aggregate: {} records from {}",
        report.aggregate_count,
        report.aggregate_path.display()
    );
    print_issues(&report.issues);

    println!(
        "\nOnly in detail: {}   Only in aggregate: {}",
        report.initial_diff.only_in_detail.len(),
        report.initial_diff.only_in_aggregate.len()
    );

    let rec = &report.reconciliation;
    print_titles("Removed (no detail file)", "-", &rec.removed, |s| s.red().to_string());
    print_titles("Added from detail", "+", &rec.added, |s| s.green().to_string());
    print_titles("Refreshed from detail", "~", &rec.refreshed, |s| {
        s.yellow().to_string()
    });
    print_order("Order before", &rec.order_before);

    println!();
    match &report.write {
        WriteResult::Written { path, digest } => println!(
            "{prefix}✎  wrote {} ({} records, sha256 {})",
            path.display(),
            rec.records.len(),
            &digest[..12.min(digest.len())]
        ),
        WriteResult::WouldWrite { path } => println!(
            "{prefix}~  would write {} ({} records)",
            path.display(),
            rec.records.len()
        ),
        WriteResult::Unchanged { path } => {
            println!("{prefix}·  {} unchanged, nothing to do", path.display())
        }
    }

    print_verification(&report.verification);
    let elapsed = (report.finished_at - report.started_at).num_milliseconds();
    if report.is_success() {
        let what = if report.changed() {
            "sync completed with changes"
        } else {
            "already in sync"
        };
        println!("{} {what} ({elapsed} ms)", "✓".green().bold());
    } else {
        println!("{} sync completed but issues remain", "✗".red().bold());
    }
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

pub fn print_check_json(report: &CheckReport) -> Result<()> {
    let payload = CheckJson {
        synced: report.verification.synced(),
        sorted: report.verification.sorted(),
        report,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize check report")?
    );
    Ok(())
}

pub fn print_check(report: &CheckReport) {
    println!("{}", "songbook check".bold());
    print_issues(&report.issues);
    let diff = &report.verification.diff;
    let only_detail: Vec<Title> = diff.only_in_detail.iter().cloned().collect();
    let only_aggregate: Vec<Title> = diff.only_in_aggregate.iter().cloned().collect();
    print_titles("Only in detail", "+", &only_detail, |s| s.green().to_string());
    print_titles("Only in aggregate", "-", &only_aggregate, |s| s.red().to_string());
    print_verification(&report.verification);
    if !report.verification.is_success() {
        println!("Run 'songbook sync' to reconcile.");
    }
}

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

fn print_issues(issues: &[UnitIssue]) {
    if issues.is_empty() {
        return;
    }
    println!("\n{} detail file issue(s):", issues.len());
    for issue in issues {
        println!("  {}  {issue}", "⚠".yellow());
    }
}

fn print_titles(heading: &str, marker: &str, titles: &[Title], paint: impl Fn(&str) -> String) {
    if titles.is_empty() {
        return;
    }
    println!("\n{heading} ({}):", titles.len());
    for title in titles {
        println!("  {}", paint(&format!("{marker} {title}")));
    }
}

fn print_order(label: &str, check: &SortCheck) {
    if check.sorted {
        println!("{label}: {}", "alphabetical".green());
        return;
    }
    println!("{label}: {}", "NOT alphabetical".red());
    if let Some(mismatch) = &check.first_mismatch {
        println!(
            "  first mismatch at position {}: '{}' should be '{}'",
            mismatch.index, mismatch.actual, mismatch.expected
        );
    }
}

fn print_verification(verification: &Verification) {
    println!("\n{}", "Verification".bold());
    print_order("Order after", &verification.order);

    let rows = vec![
        CountRow {
            source: "detail files".to_string(),
            records: verification.detail_count,
        },
        CountRow {
            source: "aggregate".to_string(),
            records: verification.aggregate_count,
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    for title in &verification.diff.only_in_detail {
        println!("  {} '{title}' still missing from aggregate", "✗".red());
    }
    for title in &verification.diff.only_in_aggregate {
        println!("  {} '{title}' still has no detail file", "✗".red());
    }
    if !verification.persisted_intact {
        println!(
            "  {} persisted aggregate differs from what was written",
            "✗".red()
        );
    }

    match (verification.synced(), verification.sorted()) {
        (true, true) => println!(
            "{} synchronized and in alphabetical order",
            "■".green().bold()
        ),
        (true, false) => println!(
            "{} synchronized but not in alphabetical order",
            "■".yellow().bold()
        ),
        (false, _) => println!("{} not synchronized", "■".red().bold()),
    }
}
