// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Reconnaissance Checks
 * Surface mapping: what answers, what stack, which entity endpoints exist
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::Result;
use tracing::{debug, info};

use super::CheckContext;
use crate::types::{Finding, Severity};

/// Probe the root and API base, recording what the target reveals about
/// itself in response headers.
pub async fn surface_probe(cx: &CheckContext) -> Result<Vec<Finding>> {
    info!("[Recon] Probing target surface: {}", cx.config.target_url);
    let mut findings = Vec::new();

    let root = cx.client.get(&cx.config.target_url).await?;
    debug!(
        "[Recon] Root answered {} in {}ms",
        root.status_code, root.duration_ms
    );

    let mut disclosed = Vec::new();
    for header in ["server", "x-powered-by", "x-aspnet-version", "x-runtime"] {
        if let Some(value) = root.header(header) {
            disclosed.push(format!("{}: {}", header, value));
        }
    }

    if !disclosed.is_empty() {
        findings.push(
            Finding::new(
                "Technology Stack Disclosure",
                "Response headers identify the server software and framework, narrowing \
                 the search space for known exploits.",
                Severity::Low,
                "Information Disclosure",
                &cx.config.target_url,
                "GET",
                2.6,
                "CWE-200",
                "A05:2021 - Security Misconfiguration",
            )
            .with_evidence(disclosed.join("\n"))
            .with_remediation(
                "Strip or genericize Server and X-Powered-By headers at the reverse proxy. \
                 Version numbers in headers are free intelligence for attackers.",
            ),
        );
    }

    // robots.txt often maps the parts of the site someone wanted hidden.
    let robots = cx.client.get(&cx.target_url("/robots.txt")).await;
    if let Ok(robots) = robots {
        if robots.status_code == 200 && robots.body.to_lowercase().contains("disallow:") {
            let interesting: Vec<&str> = robots
                .body
                .lines()
                .filter(|l| {
                    let lower = l.to_lowercase();
                    lower.starts_with("disallow:")
                        && (lower.contains("admin") || lower.contains("backup") || lower.contains("intern"))
                })
                .collect();
            if !interesting.is_empty() {
                findings.push(
                    Finding::new(
                        "Sensitive Paths Listed in robots.txt",
                        "robots.txt disallows crawler access to paths that look administrative, \
                         advertising their existence to anyone who reads the file.",
                        Severity::Info,
                        "Information Disclosure",
                        cx.target_url("/robots.txt"),
                        "GET",
                        0.0,
                        "CWE-200",
                        "A05:2021 - Security Misconfiguration",
                    )
                    .with_evidence(interesting.join("\n"))
                    .with_remediation(
                        "Do not rely on robots.txt to hide endpoints; protect them with \
                         authentication and remove the entries.",
                    ),
                );
            }
        }
    }

    Ok(findings)
}

/// Sweep the configured entity endpoint templates and record which parts
/// of the API surface actually answer. Later phases consume this surface;
/// the findings here are informational.
pub async fn endpoint_sweep(cx: &CheckContext) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    let mut reachable = Vec::new();

    for endpoint in &cx.config.endpoints {
        if !cx.config.scope.is_in_scope(&endpoint.collection_path) {
            debug!("[Recon] {} out of scope, skipping", endpoint.collection_path);
            continue;
        }
        let url = endpoint.collection_url(&cx.config.api_url);
        match cx.client.get(&url).await {
            Ok(response) if response.status_code != 404 => {
                debug!(
                    "[Recon] {} -> {} ({} bytes)",
                    endpoint.entity,
                    response.status_code,
                    response.body.len()
                );
                reachable.push(format!("{} ({})", endpoint.collection_path, response.status_code));
            }
            Ok(_) => debug!("[Recon] {} not present", endpoint.entity),
            Err(e) => debug!("[Recon] {} unreachable: {}", endpoint.entity, e),
        }
    }

    if !reachable.is_empty() {
        findings.push(
            Finding::new(
                "API Entity Endpoints Enumerated",
                "The configured business-entity endpoints answered and form the attack \
                 surface exercised by the remaining phases.",
                Severity::Info,
                "Reconnaissance",
                &cx.config.api_url,
                "GET",
                0.0,
                "CWE-200",
                "A01:2021 - Broken Access Control",
            )
            .with_evidence(reachable.join("\n")),
        );
    }

    Ok(findings)
}
