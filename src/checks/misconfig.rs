// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Misconfiguration Checks
 * Security headers, CORS policy, dangerous methods, debug surfaces
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use anyhow::Result;
use tracing::{debug, info};

use super::CheckContext;
use crate::heuristics::cors;
use crate::http_client::HttpResponse;
use crate::types::{Finding, Severity};

/// Origin presented during CORS probing; nothing the target should trust.
const ATTACKER_ORIGIN: &str = "https://audit-attacker.example";

/// Audit the security response headers on the root document. HSTS absence
/// is the single High here; the rest of the set grades lower.
pub async fn security_headers(cx: &CheckContext) -> Result<Vec<Finding>> {
    info!("[Headers] Auditing security headers on {}", cx.config.target_url);
    let response = cx.client.get(&cx.config.target_url).await?;
    Ok(judge_headers(&cx.config.target_url, &response))
}

/// Pure header verdicts, separated for offline testing.
fn judge_headers(target: &str, response: &HttpResponse) -> Vec<Finding> {
    let mut findings = Vec::new();

    if response.header("strict-transport-security").is_none() {
        findings.push(
            Finding::new(
                "Missing HSTS Header",
                "Without Strict-Transport-Security, first contact and every \
                 downgraded request can be intercepted in cleartext.",
                Severity::High,
                "Security Headers",
                target,
                "GET",
                7.4,
                "CWE-319",
                "A05:2021 - Security Misconfiguration",
            )
            .with_remediation(
                "Send Strict-Transport-Security: max-age=31536000; includeSubDomains \
                 once HTTPS coverage is complete.",
            ),
        );
    }

    if response.header("content-security-policy").is_none() {
        findings.push(
            Finding::new(
                "Missing Content-Security-Policy",
                "Without a CSP, any successful markup injection escalates to full \
                 script execution.",
                Severity::Medium,
                "Security Headers",
                target,
                "GET",
                5.3,
                "CWE-693",
                "A05:2021 - Security Misconfiguration",
            )
            .with_remediation(
                "Deploy a CSP with default-src 'self' and explicit allowances; start \
                 in report-only mode to tune.",
            ),
        );
    }

    let framing_covered = response.header("x-frame-options").is_some()
        || response
            .header("content-security-policy")
            .map(|csp| csp.contains("frame-ancestors"))
            .unwrap_or(false);
    if !framing_covered {
        findings.push(
            Finding::new(
                "Clickjacking Protection Absent",
                "The page can be framed by any site; overlaid UI can trick users \
                 into privileged clicks.",
                Severity::Medium,
                "Security Headers",
                target,
                "GET",
                4.3,
                "CWE-1021",
                "A05:2021 - Security Misconfiguration",
            )
            .with_remediation("Set X-Frame-Options: DENY or frame-ancestors 'none'."),
        );
    }

    if response.header("x-content-type-options").is_none() {
        findings.push(
            Finding::new(
                "Missing X-Content-Type-Options",
                "Browsers may MIME-sniff responses into executable types.",
                Severity::Low,
                "Security Headers",
                target,
                "GET",
                3.1,
                "CWE-693",
                "A05:2021 - Security Misconfiguration",
            )
            .with_remediation("Set X-Content-Type-Options: nosniff globally."),
        );
    }

    if response.header("referrer-policy").is_none() {
        findings.push(
            Finding::new(
                "Missing Referrer-Policy",
                "Full URLs, including any tokens they carry, leak to external sites \
                 via the Referer header.",
                Severity::Low,
                "Security Headers",
                target,
                "GET",
                3.1,
                "CWE-200",
                "A05:2021 - Security Misconfiguration",
            )
            .with_remediation("Set Referrer-Policy: strict-origin-when-cross-origin."),
        );
    }

    findings
}

/// CORS probe with an attacker-controlled Origin against root and API.
pub async fn cors_policy(cx: &CheckContext) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    let origin_header = vec![("Origin".to_string(), ATTACKER_ORIGIN.to_string())];

    let mut probed = std::collections::HashSet::new();
    for url in [cx.config.target_url.clone(), cx.api_url("/api")] {
        if !probed.insert(url.clone()) {
            continue;
        }
        let response = match cx
            .client
            .get_with_headers(&url, origin_header.clone())
            .await
        {
            Ok(response) => response,
            Err(_) => continue,
        };

        if let Some(verdict) = cors::analyze(&response, ATTACKER_ORIGIN) {
            debug!("[CORS] {} -> {}", url, verdict.summary);
            findings.push(
                Finding::new(
                    "CORS Misconfiguration",
                    verdict.summary.clone(),
                    verdict.severity,
                    "CORS",
                    &url,
                    "GET",
                    verdict.cvss,
                    "CWE-942",
                    "A05:2021 - Security Misconfiguration",
                )
                .with_payload(format!("Origin: {}", ATTACKER_ORIGIN))
                .with_evidence(verdict.evidence)
                .with_remediation(
                    "1. Maintain an explicit allowlist of trusted origins and compare \
                     the Origin header against it exactly\n\
                     2. Never reflect the Origin header back unvalidated\n\
                     3. Never combine a wildcard with Access-Control-Allow-Credentials\n\
                     4. Send Vary: Origin so caches keep per-origin responses apart\n\
                     5. Limit Access-Control-Allow-Methods to the verbs the API needs",
                ),
            );
        }
    }

    Ok(findings)
}

/// TRACE answering with its own request is Cross-Site Tracing territory.
pub async fn dangerous_methods(cx: &CheckContext) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    let response = cx
        .client
        .request_with_method("TRACE", &cx.config.target_url, vec![
            ("X-Audit-Echo".to_string(), "meduusa-trace-probe".to_string()),
        ])
        .await;

    if let Ok(response) = response {
        if response.status_code == 200 && response.body.contains("meduusa-trace-probe") {
            info!("[Methods] TRACE echoes request headers");
            findings.push(
                Finding::new(
                    "HTTP TRACE Method Enabled",
                    "TRACE echoes the full request back, including cookies and \
                     authorization headers, enabling cross-site tracing gadgets.",
                    Severity::Medium,
                    "Configuration",
                    &cx.config.target_url,
                    "TRACE",
                    5.3,
                    "CWE-693",
                    "A05:2021 - Security Misconfiguration",
                )
                .with_evidence(response.body.chars().take(200).collect::<String>())
                .with_remediation("Disable TRACE at the web server."),
            );
        }
    }

    Ok(findings)
}

/// Debug and introspection surfaces left enabled in production.
pub async fn debug_endpoints(cx: &CheckContext) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    let probes = [
        ("/debug", "debug"),
        ("/api/debug", "debug"),
        ("/actuator/env", "propertySources"),
        ("/metrics", "# HELP"),
        ("/phpinfo.php", "PHP Version"),
    ];

    for (path, marker) in probes {
        if !cx.config.scope.is_in_scope(path) {
            continue;
        }
        let url = cx.target_url(path);
        let response = match cx.client.get(&url).await {
            Ok(response) => response,
            Err(_) => continue,
        };
        if response.status_code == 200 && response.body.contains(marker) {
            findings.push(
                Finding::new(
                    format!("Debug Surface Exposed: {}", path),
                    format!(
                        "{} answers with live diagnostic output in production.",
                        path
                    ),
                    Severity::Medium,
                    "Configuration",
                    &url,
                    "GET",
                    6.5,
                    "CWE-489",
                    "A05:2021 - Security Misconfiguration",
                )
                .with_evidence(response.body.chars().take(200).collect::<String>())
                .with_remediation(
                    "Disable debug endpoints in production builds or gate them behind \
                     authenticated operations networks.",
                ),
            );
        }
    }

    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn response_with_headers(pairs: &[(&str, &str)]) -> HttpResponse {
        HttpResponse {
            status_code: 200,
            body: String::new(),
            headers: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            duration_ms: 8,
        }
    }

    #[test]
    fn test_bare_response_yields_exactly_one_hsts_high() {
        let findings = judge_headers("https://cible.fr", &response_with_headers(&[]));
        let hsts: Vec<_> = findings
            .iter()
            .filter(|f| f.title.contains("HSTS"))
            .collect();
        assert_eq!(hsts.len(), 1, "exactly one HSTS finding");
        assert_eq!(hsts[0].severity, Severity::High);
    }

    #[test]
    fn test_full_header_set_is_clean() {
        let response = response_with_headers(&[
            ("strict-transport-security", "max-age=31536000"),
            ("content-security-policy", "default-src 'self'; frame-ancestors 'none'"),
            ("x-content-type-options", "nosniff"),
            ("referrer-policy", "strict-origin-when-cross-origin"),
        ]);
        let findings = judge_headers("https://cible.fr", &response);
        assert!(findings.is_empty(), "got: {:?}", findings.iter().map(|f| &f.title).collect::<Vec<_>>());
    }

    #[test]
    fn test_csp_frame_ancestors_covers_clickjacking() {
        let response = response_with_headers(&[
            ("strict-transport-security", "max-age=63072000"),
            ("content-security-policy", "default-src 'self'; frame-ancestors 'self'"),
            ("x-content-type-options", "nosniff"),
            ("referrer-policy", "no-referrer"),
        ]);
        let findings = judge_headers("https://cible.fr", &response);
        assert!(!findings.iter().any(|f| f.title.contains("Clickjacking")));
    }

    #[tokio::test]
    async fn test_network_checks_quiet_on_dead_target() {
        let cx = crate::checks::testutil::offline_context();
        assert!(cors_policy(&cx).await.unwrap().is_empty());
        assert!(dangerous_methods(&cx).await.unwrap().is_empty());
        assert!(debug_endpoints(&cx).await.unwrap().is_empty());
    }
}
