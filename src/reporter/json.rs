// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::SeveritySummary;
use crate::types::{AuditRun, Finding};

/// The structured record: run metadata, severity summary, full finding
/// list. This is the machine-readable artifact downstream tooling parses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonReport {
    pub metadata: Metadata,
    pub summary: SeveritySummary,
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub audit_id: String,
    pub target: String,
    pub api_url: String,
    pub started_at: String,
    pub completed_at: String,
    pub duration_seconds: f64,
    pub requests_sent: u64,
    pub requests_failed: u64,
    pub phases_completed: Vec<String>,
    pub generator: String,
}

pub fn render(run: &AuditRun) -> Result<String> {
    let report = JsonReport {
        metadata: Metadata {
            audit_id: run.audit_id.clone(),
            target: run.target.clone(),
            api_url: run.api_url.clone(),
            started_at: run.started_at.clone(),
            completed_at: run.completed_at.clone(),
            duration_seconds: run.duration_seconds,
            requests_sent: run.requests_sent,
            requests_failed: run.requests_failed,
            phases_completed: run.phases_completed.clone(),
            generator: format!("meduusa-auditor {}", env!("CARGO_PKG_VERSION")),
        },
        summary: SeveritySummary::from_run(run),
        findings: run.findings.clone(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::testutil::sample_run;

    #[test]
    fn test_round_trip_preserves_counts() {
        let run = sample_run();
        let rendered = render(&run).unwrap();
        let parsed: JsonReport = serde_json::from_str(&rendered).unwrap();

        assert_eq!(parsed.findings.len(), run.findings.len());
        assert_eq!(parsed.summary, SeveritySummary::from_run(&run));
        assert_eq!(parsed.summary.tier_sum(), parsed.findings.len());
        assert_eq!(parsed.metadata.requests_sent, 412);
    }

    #[test]
    fn test_camel_case_field_names() {
        let rendered = render(&sample_run()).unwrap();
        assert!(rendered.contains("\"auditId\""));
        assert!(rendered.contains("\"requestsSent\""));
        assert!(rendered.contains("\"discoveredAt\""));
    }
}
