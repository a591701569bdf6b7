// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Severity tier of a finding, ordered from worst to benign.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];

    /// Conventional CVSS band for the tier. Findings are clamped into
    /// this band at construction time.
    pub fn cvss_band(&self) -> (f32, f32) {
        match self {
            Severity::Critical => (9.0, 10.0),
            Severity::High => (7.0, 8.9),
            Severity::Medium => (4.0, 6.9),
            Severity::Low => (0.1, 3.9),
            Severity::Info => (0.0, 3.9),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maximum length of an evidence snippet kept on a finding. Responses can
/// be multi-megabyte; reports should not be.
const MAX_EVIDENCE_LEN: usize = 600;

/// A single reported security issue. Immutable once created; the only way
/// to build one is [`Finding::new`], which enforces the severity/CVSS band.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub category: String,
    pub endpoint: String,
    pub method: String,
    pub parameter: Option<String>,
    pub payload: Option<String>,
    pub evidence: Option<String>,
    pub remediation: String,
    pub cvss: f32,
    pub cwe: String,
    pub owasp: String,
    pub discovered_at: String,
}

impl Finding {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        category: impl Into<String>,
        endpoint: impl Into<String>,
        method: impl Into<String>,
        cvss: f32,
        cwe: impl Into<String>,
        owasp: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let (lo, hi) = severity.cvss_band();
        let clamped = cvss.clamp(lo, hi);
        if (clamped - cvss).abs() > f32::EPSILON {
            warn!(
                "[Finding] CVSS {:.1} outside {} band [{:.1}, {:.1}] for '{}' - clamped to {:.1}",
                cvss, severity, lo, hi, title, clamped
            );
        }

        Self {
            title,
            description: description.into(),
            severity,
            category: category.into(),
            endpoint: endpoint.into(),
            method: method.into(),
            parameter: None,
            payload: None,
            evidence: None,
            remediation: String::new(),
            cvss: clamped,
            cwe: cwe.into(),
            owasp: owasp.into(),
            discovered_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Attach a response evidence snippet, truncated to a report-friendly size.
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        let mut evidence = evidence.into();
        if evidence.len() > MAX_EVIDENCE_LEN {
            let mut cut = MAX_EVIDENCE_LEN;
            while !evidence.is_char_boundary(cut) {
                cut -= 1;
            }
            evidence.truncate(cut);
            evidence.push_str("...[truncated]");
        }
        self.evidence = Some(evidence);
        self
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = remediation.into();
        self
    }
}

/// Finalized result of a complete audit run. Created by the orchestrator,
/// consumed by the reporter; the process holds no state afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRun {
    pub audit_id: String,
    pub target: String,
    pub api_url: String,
    pub started_at: String,
    pub completed_at: String,
    pub duration_seconds: f64,
    pub findings: Vec<Finding>,
    pub requests_sent: u64,
    pub requests_failed: u64,
    pub phases_completed: Vec<String>,
}

impl AuditRun {
    /// Count findings per severity tier. Every tier is present in the map
    /// even when zero, so the three report formats always agree.
    pub fn severity_counts(&self) -> HashMap<Severity, usize> {
        let mut counts: HashMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        for finding in &self.findings {
            *counts.entry(finding.severity).or_insert(0) += 1;
        }
        counts
    }

    pub fn count_of(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cvss_clamped_into_severity_band() {
        let f = Finding::new(
            "Test",
            "desc",
            Severity::Critical,
            "Injection",
            "/api/x",
            "GET",
            7.5,
            "CWE-89",
            "A03:2021 - Injection",
        );
        assert!(f.cvss >= 9.0, "critical findings must carry CVSS >= 9.0");

        let f = Finding::new(
            "Test",
            "desc",
            Severity::Low,
            "Info",
            "/",
            "GET",
            9.8,
            "CWE-200",
            "A01:2021 - Broken Access Control",
        );
        assert!(f.cvss <= 3.9, "low findings must carry CVSS <= 3.9");
    }

    #[test]
    fn test_cvss_in_band_untouched() {
        for (severity, cvss) in [
            (Severity::Critical, 9.8),
            (Severity::High, 7.5),
            (Severity::Medium, 5.3),
            (Severity::Low, 3.1),
            (Severity::Info, 0.0),
        ] {
            let f = Finding::new("t", "d", severity, "c", "/", "GET", cvss, "CWE-1", "A00");
            assert_eq!(f.cvss, cvss);
        }
    }

    #[test]
    fn test_evidence_truncation() {
        let f = Finding::new(
            "t", "d", Severity::Info, "c", "/", "GET", 0.0, "CWE-1", "A00",
        )
        .with_evidence("x".repeat(5000));
        let evidence = f.evidence.unwrap();
        assert!(evidence.len() < 700);
        assert!(evidence.ends_with("...[truncated]"));
    }

    #[test]
    fn test_severity_counts_cover_all_tiers() {
        let run = AuditRun {
            audit_id: "a".into(),
            target: "https://example.com".into(),
            api_url: "https://example.com/api".into(),
            started_at: String::new(),
            completed_at: String::new(),
            duration_seconds: 0.0,
            findings: vec![
                Finding::new("a", "d", Severity::High, "c", "/", "GET", 7.5, "CWE-1", "A00"),
                Finding::new("b", "d", Severity::High, "c", "/", "GET", 7.1, "CWE-1", "A00"),
                Finding::new("c", "d", Severity::Info, "c", "/", "GET", 0.0, "CWE-1", "A00"),
            ],
            requests_sent: 10,
            requests_failed: 0,
            phases_completed: vec![],
        };

        let counts = run.severity_counts();
        assert_eq!(counts.len(), 5);
        assert_eq!(counts[&Severity::High], 2);
        assert_eq!(counts[&Severity::Info], 1);
        assert_eq!(counts[&Severity::Critical], 0);
        assert_eq!(counts.values().sum::<usize>(), run.findings.len());
    }
}
