// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! The three report formats are views over one aggregate: the total and
//! per-severity counts must match bit-for-bit across all of them.

use meduusa_auditor::reporter::{self, json, markdown, summary, SeveritySummary};
use meduusa_auditor::types::{AuditRun, Finding, Severity};

fn finding(title: &str, severity: Severity, cvss: f32) -> Finding {
    Finding::new(
        title,
        "description",
        severity,
        "Test Category",
        "/api/endpoint",
        "GET",
        cvss,
        "CWE-000",
        "A00:2021 - Test",
    )
}

fn run_with_findings(findings: Vec<Finding>) -> AuditRun {
    AuditRun {
        audit_id: "itest-0001".to_string(),
        target: "https://cible.fr".to_string(),
        api_url: "https://cible.fr".to_string(),
        started_at: "2026-08-06T08:00:00Z".to_string(),
        completed_at: "2026-08-06T08:10:00Z".to_string(),
        duration_seconds: 600.0,
        findings,
        requests_sent: 100,
        requests_failed: 2,
        phases_completed: vec!["Reconnaissance".to_string()],
    }
}

fn sample_findings() -> Vec<Finding> {
    vec![
        finding("Critical A", Severity::Critical, 9.8),
        finding("Critical B", Severity::Critical, 9.1),
        finding("High A", Severity::High, 7.5),
        finding("Medium A", Severity::Medium, 5.3),
        finding("Medium B", Severity::Medium, 4.4),
        finding("Medium C", Severity::Medium, 6.1),
        finding("Low A", Severity::Low, 2.2),
        finding("Info A", Severity::Info, 0.0),
    ]
}

/// Counts extracted from the markdown summary table.
fn markdown_counts(md: &str) -> (usize, usize, usize, usize, usize, usize) {
    let grab = |tier: &str| -> usize {
        md.lines()
            .find(|line| line.starts_with(&format!("| {} |", tier)))
            .and_then(|line| line.split('|').nth(2))
            .and_then(|cell| cell.trim().parse().ok())
            .unwrap_or(usize::MAX)
    };
    let total = md
        .lines()
        .find(|line| line.starts_with("| **Total** |"))
        .and_then(|line| line.split('|').nth(2))
        .and_then(|cell| cell.trim().trim_matches('*').parse().ok())
        .unwrap_or(usize::MAX);
    (
        grab("CRITICAL"),
        grab("HIGH"),
        grab("MEDIUM"),
        grab("LOW"),
        grab("INFO"),
        total,
    )
}

/// Counts extracted from the CSV count block.
fn csv_counts(text: &str) -> (usize, usize, usize, usize, usize, usize) {
    let grab = |key: &str| -> usize {
        text.lines()
            .find(|line| line.starts_with(&format!("# {},", key)))
            .and_then(|line| line.split(',').nth(1))
            .and_then(|cell| cell.trim().parse().ok())
            .unwrap_or(usize::MAX)
    };
    (
        grab("critical"),
        grab("high"),
        grab("medium"),
        grab("low"),
        grab("info"),
        grab("total"),
    )
}

#[test]
fn counts_identical_across_all_three_formats() {
    let run = run_with_findings(sample_findings());
    let expected = SeveritySummary::from_run(&run);
    assert_eq!(expected.tier_sum(), run.findings.len());

    // JSON
    let parsed: json::JsonReport =
        serde_json::from_str(&json::render(&run).unwrap()).unwrap();
    assert_eq!(parsed.summary, expected);
    assert_eq!(parsed.findings.len(), expected.total);

    // Markdown
    let md = markdown::render(&run).unwrap();
    assert_eq!(
        markdown_counts(&md),
        (
            expected.critical,
            expected.high,
            expected.medium,
            expected.low,
            expected.info,
            expected.total
        )
    );

    // CSV
    let csv_text = String::from_utf8(summary::render(&run).unwrap()).unwrap();
    assert_eq!(
        csv_counts(&csv_text),
        (
            expected.critical,
            expected.high,
            expected.medium,
            expected.low,
            expected.info,
            expected.total
        )
    );
    // One data row per finding below the header.
    let data_rows = csv_text
        .lines()
        .skip_while(|line| !line.starts_with("Severity,"))
        .skip(1)
        .count();
    assert_eq!(data_rows, expected.total);
}

#[test]
fn empty_run_is_consistent_too() {
    let run = run_with_findings(Vec::new());
    let expected = SeveritySummary::from_run(&run);
    assert_eq!(expected.total, 0);

    let parsed: json::JsonReport =
        serde_json::from_str(&json::render(&run).unwrap()).unwrap();
    assert_eq!(parsed.summary, expected);

    let md = markdown::render(&run).unwrap();
    assert_eq!(markdown_counts(&md).5, 0);

    let csv_text = String::from_utf8(summary::render(&run).unwrap()).unwrap();
    assert_eq!(csv_counts(&csv_text).5, 0);
}

#[test]
fn written_artifacts_agree_on_disk() {
    let run = run_with_findings(sample_findings());
    let dir = std::env::temp_dir().join("meduusa-consistency-itest");
    std::fs::remove_dir_all(&dir).ok();

    let paths = reporter::write_reports(&run, &dir).unwrap();
    let expected = SeveritySummary::from_run(&run);

    let parsed: json::JsonReport =
        serde_json::from_str(&std::fs::read_to_string(&paths.json).unwrap()).unwrap();
    let md = std::fs::read_to_string(&paths.markdown).unwrap();
    let csv_text = std::fs::read_to_string(&paths.csv).unwrap();

    assert_eq!(parsed.summary, expected);
    assert_eq!(markdown_counts(&md).5, expected.total);
    assert_eq!(csv_counts(&csv_text).5, expected.total);

    std::fs::remove_dir_all(&dir).ok();
}
