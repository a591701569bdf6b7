// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Vulnerability Fingerprinting Checks
 * Forced errors that make the stack identify itself
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::Result;
use tracing::{debug, info};

use super::{random_marker, CheckContext};
use crate::heuristics::error_patterns;
use crate::types::{Finding, Severity};

/// Provoke error paths and match the responses against known error-text
/// shapes. A stack trace or raw database error in production is both an
/// information leak and a sign that deeper injection probes will be loud.
pub async fn forced_errors(cx: &CheckContext) -> Result<Vec<Finding>> {
    info!("[Fingerprint] Forcing error responses");
    let mut findings = Vec::new();

    // 1. A path that cannot exist: does the 404 handler leak?
    let missing = cx.api_url(&format!("/api/{}", random_marker("nonexistent")));
    if let Ok(response) = cx.client.get(&missing).await {
        inspect_error_body(&missing, "GET", &response.body, &mut findings);
    }

    // 2. Malformed JSON against the signin endpoint: parser error paths.
    let signin = cx.config.signin_url();
    if let Ok(response) = cx
        .client
        .post_raw(&signin, "{\"email\": \"broken".to_string(), "application/json", vec![])
        .await
    {
        inspect_error_body(&signin, "POST", &response.body, &mut findings);
    }

    // 3. A stray quote in the first entity's search parameter.
    if let Some(endpoint) = cx.config.endpoints.first() {
        let url = format!(
            "{}?{}={}",
            endpoint.collection_url(&cx.config.api_url),
            endpoint.search_param,
            urlencoded("'\"")
        );
        if let Ok(response) = cx.client.get(&url).await {
            inspect_error_body(&url, "GET", &response.body, &mut findings);
        }
    }

    Ok(findings)
}

fn inspect_error_body(endpoint: &str, method: &str, body: &str, findings: &mut Vec<Finding>) {
    if let Some(framework) = error_patterns::match_stack_trace(body) {
        debug!("[Fingerprint] {} stack trace at {}", framework, endpoint);
        findings.push(
            Finding::new(
                format!("{} Stack Trace Disclosure", framework),
                "Forced errors return a raw stack trace, exposing internal paths, \
                 frameworks and line numbers.",
                Severity::Medium,
                "Information Disclosure",
                endpoint,
                method,
                5.3,
                "CWE-209",
                "A05:2021 - Security Misconfiguration",
            )
            .with_evidence(first_lines(body, 6))
            .with_remediation(
                "Register a production error handler that logs the trace server-side \
                 and returns an opaque error identifier to the client.",
            ),
        );
    } else if let Some(db) = error_patterns::match_sql_error(body) {
        debug!("[Fingerprint] {} error text at {}", db, endpoint);
        findings.push(
            Finding::new(
                format!("Raw {} Error Disclosure", db),
                "Database error text reaches the client verbatim, identifying the \
                 engine and echoing query fragments.",
                Severity::Medium,
                "Information Disclosure",
                endpoint,
                method,
                5.3,
                "CWE-209",
                "A05:2021 - Security Misconfiguration",
            )
            .with_evidence(first_lines(body, 6))
            .with_remediation(
                "Catch database errors at the data layer and map them to generic \
                 client-facing messages.",
            ),
        );
    }
}

/// Version strings in headers or default error pages.
pub async fn version_disclosure(cx: &CheckContext) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    let response = cx.client.get(&cx.config.target_url).await?;

    for header in ["server", "x-powered-by"] {
        if let Some(value) = response.header(header) {
            if value.chars().any(|c| c.is_ascii_digit()) {
                findings.push(
                    Finding::new(
                        "Component Version Disclosed in Headers",
                        "A response header carries an exact component version, letting \
                         attackers match it against public CVE feeds without probing.",
                        Severity::Low,
                        "Information Disclosure",
                        &cx.config.target_url,
                        "GET",
                        3.1,
                        "CWE-200",
                        "A06:2021 - Vulnerable and Outdated Components",
                    )
                    .with_evidence(format!("{}: {}", header, value))
                    .with_remediation("Remove version tokens from server headers at the proxy."),
                );
            }
        }
    }

    // An unusual verb against the signin endpoint: default framework
    // error pages name themselves.
    let probe = cx
        .client
        .request_with_method("OPTIONS", &cx.config.signin_url(), vec![])
        .await;
    if let Ok(probe) = probe {
        if error_patterns::has_verbose_error(&probe.body) {
            findings.push(
                Finding::new(
                    "Default Framework Error Page",
                    "Unusual methods render the framework's default error page with \
                     internal details.",
                    Severity::Low,
                    "Information Disclosure",
                    cx.config.signin_url(),
                    "OPTIONS",
                    3.1,
                    "CWE-209",
                    "A05:2021 - Security Misconfiguration",
                )
                .with_evidence(first_lines(&probe.body, 4)),
            );
        }
    }

    Ok(findings)
}

fn first_lines(body: &str, n: usize) -> String {
    body.lines().take(n).collect::<Vec<_>>().join("\n")
}

fn urlencoded(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            other => format!("%{:02X}", other),
        })
        .collect()
}
