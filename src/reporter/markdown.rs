// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::Result;

use super::SeveritySummary;
use crate::types::{AuditRun, Severity};

/// Human-readable assessment document: summary table, then findings
/// grouped by severity with evidence and remediation.
pub fn render(run: &AuditRun) -> Result<String> {
    let summary = SeveritySummary::from_run(run);
    let mut md = String::new();

    md.push_str("# Security Assessment Report\n\n");
    md.push_str(&format!("**Target:** {}\n\n", run.target));
    md.push_str(&format!("**Audit ID:** {}\n\n", run.audit_id));
    md.push_str(&format!(
        "**Window:** {} .. {} ({:.0}s)\n\n",
        run.started_at, run.completed_at, run.duration_seconds
    ));
    md.push_str(&format!(
        "**Traffic:** {} requests sent, {} failed\n\n",
        run.requests_sent, run.requests_failed
    ));
    md.push_str(&format!(
        "**Phases:** {}\n\n",
        run.phases_completed.join(", ")
    ));
    md.push_str("---\n\n");

    md.push_str("## Summary\n\n");
    md.push_str("| Severity | Count |\n");
    md.push_str("|----------|-------|\n");
    md.push_str(&format!("| CRITICAL | {} |\n", summary.critical));
    md.push_str(&format!("| HIGH | {} |\n", summary.high));
    md.push_str(&format!("| MEDIUM | {} |\n", summary.medium));
    md.push_str(&format!("| LOW | {} |\n", summary.low));
    md.push_str(&format!("| INFO | {} |\n", summary.info));
    md.push_str(&format!("| **Total** | **{}** |\n\n", summary.total));

    for severity in Severity::ALL {
        let group: Vec<_> = run
            .findings
            .iter()
            .filter(|f| f.severity == severity)
            .collect();
        if group.is_empty() {
            continue;
        }

        md.push_str(&format!("## {} Findings\n\n", severity));
        for finding in group {
            md.push_str(&format!("### {}\n\n", finding.title));
            md.push_str(&format!(
                "- **Category:** {} | **CVSS:** {:.1} | **CWE:** {} | **OWASP:** {}\n",
                finding.category, finding.cvss, finding.cwe, finding.owasp
            ));
            md.push_str(&format!(
                "- **Endpoint:** `{} {}`\n",
                finding.method, finding.endpoint
            ));
            if let Some(parameter) = &finding.parameter {
                md.push_str(&format!("- **Parameter:** `{}`\n", parameter));
            }
            if let Some(payload) = &finding.payload {
                md.push_str(&format!("- **Payload:** `{}`\n", payload.replace('`', "'")));
            }
            md.push_str(&format!("\n{}\n\n", finding.description));
            if let Some(evidence) = &finding.evidence {
                md.push_str("**Evidence:**\n\n```\n");
                md.push_str(&evidence.replace("```", "` ` `"));
                md.push_str("\n```\n\n");
            }
            if !finding.remediation.is_empty() {
                md.push_str(&format!("**Remediation:** {}\n\n", finding.remediation));
            }
        }
    }

    if run.findings.is_empty() {
        md.push_str("_No findings were produced by this run._\n");
    }

    Ok(md)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::testutil::sample_run;

    #[test]
    fn test_summary_table_counts_match_run() {
        let run = sample_run();
        let md = render(&run).unwrap();
        assert!(md.contains("| CRITICAL | 1 |"));
        assert!(md.contains("| HIGH | 1 |"));
        assert!(md.contains("| MEDIUM | 0 |"));
        assert!(md.contains(&format!("| **Total** | **{}** |", run.findings.len())));
    }

    #[test]
    fn test_findings_grouped_by_severity() {
        let md = render(&sample_run()).unwrap();
        let critical_pos = md.find("## CRITICAL Findings").unwrap();
        let high_pos = md.find("## HIGH Findings").unwrap();
        let info_pos = md.find("## INFO Findings").unwrap();
        assert!(critical_pos < high_pos && high_pos < info_pos);
        // No medium findings in the sample: the section must be absent.
        assert!(!md.contains("## MEDIUM Findings"));
    }

    #[test]
    fn test_evidence_fencing_survives_backticks() {
        let mut run = sample_run();
        run.findings[0].evidence = Some("evil ``` fence".to_string());
        let md = render(&run).unwrap();
        assert!(!md.contains("evil ``` fence"));
    }

    #[test]
    fn test_empty_run_renders_placeholder() {
        let mut run = sample_run();
        run.findings.clear();
        let md = render(&run).unwrap();
        assert!(md.contains("No findings"));
    }
}
