// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Report Generation
 * Three views over one AuditRun: JSON record, markdown document, CSV table
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::{AuditRun, Severity};

pub mod json;
pub mod markdown;
pub mod summary;

/// Severity tallies shared by all three formats. Derived once from the
/// run so the formats cannot drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeveritySummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub info: usize,
    pub total: usize,
}

impl SeveritySummary {
    pub fn from_run(run: &AuditRun) -> Self {
        let counts = run.severity_counts();
        Self {
            critical: counts[&Severity::Critical],
            high: counts[&Severity::High],
            medium: counts[&Severity::Medium],
            low: counts[&Severity::Low],
            info: counts[&Severity::Info],
            total: run.findings.len(),
        }
    }

    pub fn tier_sum(&self) -> usize {
        self.critical + self.high + self.medium + self.low + self.info
    }
}

/// Paths of the rendered artifacts.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub markdown: PathBuf,
    pub csv: PathBuf,
}

/// Render all three formats into `output_dir`. Each renderer receives the
/// same run; every format is attempted even if an earlier one failed to
/// write, and the first error is reported after the attempts.
pub fn write_reports(run: &AuditRun, output_dir: &Path) -> Result<ReportPaths> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("cannot create report directory {}", output_dir.display()))?;

    let stem = format!("audit-{}", run.audit_id);
    let paths = ReportPaths {
        json: output_dir.join(format!("{}.json", stem)),
        markdown: output_dir.join(format!("{}.md", stem)),
        csv: output_dir.join(format!("{}.csv", stem)),
    };

    let mut first_error: Option<anyhow::Error> = None;
    let mut attempt = |path: &Path, contents: Result<Vec<u8>>| {
        let outcome = contents.and_then(|bytes| {
            std::fs::write(path, bytes)
                .with_context(|| format!("cannot write {}", path.display()))
        });
        match outcome {
            Ok(()) => info!("[Report] Wrote {}", path.display()),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    };

    attempt(&paths.json, json::render(run).map(String::into_bytes));
    attempt(&paths.markdown, markdown::render(run).map(String::into_bytes));
    attempt(&paths.csv, summary::render(run));

    match first_error {
        Some(e) => Err(e),
        None => Ok(paths),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use testutil::sample_run;

    #[test]
    fn test_summary_matches_findings() {
        let run = sample_run();
        let summary = SeveritySummary::from_run(&run);
        assert_eq!(summary.total, run.findings.len());
        assert_eq!(summary.tier_sum(), summary.total);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.high, 1);
        assert_eq!(summary.medium, 0);
        assert_eq!(summary.low, 1);
        assert_eq!(summary.info, 1);
    }

    #[test]
    fn test_write_reports_produces_three_files() {
        let run = sample_run();
        let dir = std::env::temp_dir().join(format!("meduusa-report-test-{}", run.audit_id));
        let paths = write_reports(&run, &dir).unwrap();

        assert!(paths.json.exists());
        assert!(paths.markdown.exists());
        assert!(paths.csv.exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
