// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::Result;

use super::SeveritySummary;
use crate::types::AuditRun;

/// Compact tabular summary: one header block with the tier counts, then
/// one row per finding.
pub fn render(run: &AuditRun) -> Result<Vec<u8>> {
    let summary = SeveritySummary::from_run(run);
    // Records intentionally vary in width (4-field count block vs. 9-field
    // finding rows), so the writer must run in flexible mode.
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(vec![]);

    // Counts block first so spreadsheet consumers see the totals without
    // formulas; identical numbers to the JSON and markdown views.
    let count_rows = [
        ("# target", run.target.clone()),
        ("# total", summary.total.to_string()),
        ("# critical", summary.critical.to_string()),
        ("# high", summary.high.to_string()),
        ("# medium", summary.medium.to_string()),
        ("# low", summary.low.to_string()),
        ("# info", summary.info.to_string()),
    ];
    for (label, value) in &count_rows {
        wtr.write_record([*label, value.as_str(), "", ""])?;
    }

    wtr.write_record([
        "Severity",
        "Title",
        "Category",
        "Endpoint",
        "Method",
        "Parameter",
        "CVSS",
        "CWE",
        "OWASP",
    ])?;

    for finding in &run.findings {
        let cvss = format!("{:.1}", finding.cvss);
        wtr.write_record([
            finding.severity.as_str(),
            finding.title.as_str(),
            finding.category.as_str(),
            finding.endpoint.as_str(),
            finding.method.as_str(),
            finding.parameter.as_deref().unwrap_or(""),
            cvss.as_str(),
            finding.cwe.as_str(),
            finding.owasp.as_str(),
        ])?;
    }

    Ok(wtr.into_inner()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::testutil::sample_run;

    #[test]
    fn test_row_count_matches_findings() {
        let run = sample_run();
        let bytes = render(&run).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        // 7 count lines + 1 header + one row per finding.
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 7 + 1 + run.findings.len());
        assert!(text.contains("# total,4"));
        assert!(text.contains("# critical,1"));
    }

    #[test]
    fn test_counts_identical_to_summary() {
        let run = sample_run();
        let text = String::from_utf8(render(&run).unwrap()).unwrap();
        let summary = SeveritySummary::from_run(&run);
        assert!(text.contains(&format!("# total,{}", summary.total)));
        assert!(text.contains(&format!("# high,{}", summary.high)));
        assert!(text.contains(&format!("# info,{}", summary.info)));
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let mut run = sample_run();
        run.findings[0].title = "Injection, with a comma".to_string();
        let text = String::from_utf8(render(&run).unwrap()).unwrap();
        assert!(text.contains("\"Injection, with a comma\""));
    }
}
