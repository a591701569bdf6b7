// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Data Exposure Checks
 * Leftover files, directory listings, open bulk exports
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::Result;
use tracing::{debug, info};

use super::CheckContext;
use crate::types::{Finding, Severity};

/// Files that have no business being reachable, with a content sniff that
/// must also match before reporting (SPA fallbacks answer 200 for
/// everything).
const SENSITIVE_FILES: &[(&str, &str, Severity, f32)] = &[
    ("/.env", "=", Severity::Critical, 9.1),
    ("/.git/config", "[core]", Severity::High, 7.5),
    ("/backup.sql", "INSERT INTO", Severity::Critical, 9.1),
    ("/dump.sql", "CREATE TABLE", Severity::Critical, 9.1),
    ("/docker-compose.yml", "services:", Severity::High, 7.5),
    ("/config.json", "password", Severity::High, 7.5),
];

/// Sweep for forgotten operational files at the web root.
pub async fn sensitive_files(cx: &CheckContext) -> Result<Vec<Finding>> {
    info!("[Exposure] Sweeping for leftover operational files");
    let mut findings = Vec::new();

    for (path, marker, severity, cvss) in SENSITIVE_FILES {
        if !cx.config.scope.is_in_scope(path) {
            continue;
        }
        let url = cx.target_url(path);
        let response = match cx.client.get(&url).await {
            Ok(response) => response,
            Err(_) => continue,
        };
        if response.status_code != 200 || !response.body.contains(marker) {
            continue;
        }

        debug!("[Exposure] {} answered with matching content", path);
        findings.push(
            Finding::new(
                format!("Exposed File: {}", path),
                format!(
                    "The file at {} is publicly readable and its content matches the \
                     expected format; secrets or full data dumps are one GET away.",
                    path
                ),
                *severity,
                "Data Exposure",
                &url,
                "GET",
                *cvss,
                "CWE-538",
                "A05:2021 - Security Misconfiguration",
            )
            .with_evidence(response.body.chars().take(200).collect::<String>())
            .with_remediation(
                "Remove operational files from the web root, deny dotfiles at the \
                 proxy, and rotate any credential that was reachable.",
            ),
        );
    }

    Ok(findings)
}

/// Autoindex pages under upload/static prefixes.
pub async fn directory_listing(cx: &CheckContext) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    for path in ["/uploads/", "/static/", "/files/", "/public/"] {
        if !cx.config.scope.is_in_scope(path) {
            continue;
        }
        let url = cx.target_url(path);
        let response = match cx.client.get(&url).await {
            Ok(response) => response,
            Err(_) => continue,
        };
        let body_lower = response.body.to_lowercase();
        let is_listing = response.status_code == 200
            && (body_lower.contains("index of /") || body_lower.contains("<title>directory listing"));

        if is_listing {
            findings.push(
                Finding::new(
                    "Directory Listing Enabled",
                    format!(
                        "{} renders an automatic index of its contents; every uploaded \
                         file is enumerable without knowing its name.",
                        path
                    ),
                    Severity::Medium,
                    "Data Exposure",
                    &url,
                    "GET",
                    5.3,
                    "CWE-548",
                    "A05:2021 - Security Misconfiguration",
                )
                .with_evidence(response.body.chars().take(200).collect::<String>())
                .with_remediation("Disable autoindex on the web server for all paths."),
            );
        }
    }

    Ok(findings)
}

/// Bulk export endpoints reachable without credentials.
pub async fn bulk_export(cx: &CheckContext) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    let mut candidates = vec!["/api/export".to_string()];
    for endpoint in &cx.config.endpoints {
        candidates.push(format!("{}/export", endpoint.collection_path));
    }

    for path in candidates {
        if !cx.config.scope.is_in_scope(&path) {
            continue;
        }
        let url = cx.api_url(&path);
        let response = match cx.client.get(&url).await {
            Ok(response) => response,
            Err(_) => continue,
        };
        if response.status_code != 200 {
            continue;
        }

        let looks_bulk = response.body.len() > 10_000
            || response
                .header("content-type")
                .map(|ct| ct.contains("csv") || ct.contains("spreadsheet"))
                .unwrap_or(false)
            || response
                .header("content-disposition")
                .map(|cd| cd.contains("attachment"))
                .unwrap_or(false);

        if looks_bulk {
            info!("[Exposure] Unauthenticated bulk export at {}", path);
            findings.push(
                Finding::new(
                    "Unauthenticated Bulk Data Export",
                    format!(
                        "The export endpoint {} streams a bulk dataset to anonymous \
                         callers.",
                        path
                    ),
                    Severity::High,
                    "Data Exposure",
                    &url,
                    "GET",
                    7.5,
                    "CWE-200",
                    "A01:2021 - Broken Access Control",
                )
                .with_evidence(format!(
                    "{} bytes, content-type {}",
                    response.body.len(),
                    response.header("content-type").unwrap_or("unset")
                ))
                .with_remediation(
                    "Require authentication and an explicit export permission; audit \
                     who exports what.",
                ),
            );
        }
    }

    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::offline_context;

    #[test]
    fn test_sensitive_file_table_severities_in_band() {
        for (path, _, severity, cvss) in SENSITIVE_FILES {
            let (lo, hi) = severity.cvss_band();
            assert!(
                *cvss >= lo && *cvss <= hi,
                "{} carries CVSS {} outside {} band",
                path,
                cvss,
                severity
            );
        }
    }

    #[tokio::test]
    async fn test_checks_quiet_on_dead_target() {
        let cx = offline_context();
        assert!(sensitive_files(&cx).await.unwrap().is_empty());
        assert!(directory_listing(&cx).await.unwrap().is_empty());
        assert!(bulk_export(&cx).await.unwrap().is_empty());
    }
}
