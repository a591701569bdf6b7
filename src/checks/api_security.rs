// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - API Security Checks
 * Mass assignment, method tampering, unbounded listings
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::Result;
use serde_json::json;
use tracing::{debug, info};

use super::{random_email, CheckContext};
use crate::types::{Finding, Severity};

/// Register an account while injecting privileged fields, then verify via
/// the returned principal whether any of them stuck.
pub async fn mass_assignment(cx: &CheckContext) -> Result<Vec<Finding>> {
    let signup = cx.config.signup_url();
    let email = random_email();
    info!("[MassAssign] Probing {} with privileged fields", signup);

    let body = json!({
        "email": email,
        "password": "Audit#2026-temporaire",
        "nom": "Compte Audit",
        // Fields no registration form should accept:
        "role": "admin",
        "isAdmin": true,
        "verified": true,
    });

    let response = match cx.client.post_json(&signup, &body).await {
        Ok(response) => response,
        Err(e) => {
            debug!("[MassAssign] Registration probe failed: {}", e);
            return Ok(Vec::new());
        }
    };

    if !response.is_success() {
        // Registration rejected outright: nothing to escalate.
        return Ok(Vec::new());
    }

    // The principal usually comes back in the signup or signin response.
    let principal = if response.body.contains("role") || response.body.contains("isAdmin") {
        Some(response.body.clone())
    } else {
        let login = cx
            .client
            .post_json(
                &cx.config.signin_url(),
                &json!({"email": email, "password": "Audit#2026-temporaire"}),
            )
            .await
            .ok();
        login.map(|r| r.body)
    };

    let mut findings = Vec::new();
    if let Some(principal) = principal {
        if privileged_field_stuck(&principal) {
            findings.push(
                Finding::new(
                    "Mass Assignment Grants Privileged Role",
                    "The registration endpoint copies attacker-supplied 'role'/'isAdmin' \
                     fields onto the new account, handing out administrative access for \
                     the price of a signup.",
                    Severity::Critical,
                    "Mass Assignment",
                    &signup,
                    "POST",
                    9.1,
                    "CWE-915",
                    "A08:2021 - Software and Data Integrity Failures",
                )
                .with_parameter("role")
                .with_payload(r#"{"role":"admin","isAdmin":true}"#)
                .with_evidence(principal.chars().take(400).collect::<String>())
                .with_remediation(
                    "Bind request bodies to an explicit DTO containing only the fields a \
                     client may set; assign role and verification flags server-side.",
                ),
            );
        }
    }

    Ok(findings)
}

/// True when the returned principal carries one of the injected
/// privileged values.
fn privileged_field_stuck(principal_body: &str) -> bool {
    let value: serde_json::Value = match serde_json::from_str(principal_body) {
        Ok(value) => value,
        Err(_) => return false,
    };
    let null = serde_json::Value::Null;
    let candidates = [&value, value.get("user").unwrap_or(&null)];
    for candidate in candidates {
        if candidate.get("role").and_then(|r| r.as_str()) == Some("admin") {
            return true;
        }
        if candidate.get("isAdmin").and_then(|a| a.as_bool()) == Some(true) {
            return true;
        }
    }
    false
}

/// Try write methods against item endpoints without any credentials.
/// A 2xx means state-changing verbs are open to the world.
pub async fn method_tampering(cx: &CheckContext) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    for endpoint in &cx.config.endpoints {
        if !cx.config.scope.is_in_scope(&endpoint.collection_path) {
            continue;
        }
        let url = endpoint.item_url(&cx.config.api_url, 1);

        for method in ["PUT", "DELETE", "PATCH"] {
            let response = match cx.client.request_with_method(method, &url, vec![]).await {
                Ok(response) => response,
                Err(_) => continue,
            };
            if response.is_success() {
                info!("[Methods] Unauthenticated {} accepted at {}", method, url);
                findings.push(
                    Finding::new(
                        format!("Unauthenticated {} Accepted", method),
                        format!(
                            "The '{}' item endpoint accepts {} without credentials; \
                             anyone can alter or destroy records.",
                            endpoint.entity, method
                        ),
                        Severity::High,
                        "Broken Access Control",
                        &url,
                        method,
                        8.2,
                        "CWE-306",
                        "A01:2021 - Broken Access Control",
                    )
                    .with_evidence(format!("{} {} -> {}", method, url, response.status_code))
                    .with_remediation(
                        "Require authentication and per-object authorization on every \
                         state-changing verb, not only on the UI paths.",
                    ),
                );
                break; // one verb per entity is enough evidence
            }
        }
    }

    Ok(findings)
}

/// Oversized pagination parameters. A server that honors limit=100000
/// lets one request pull the whole table (and strains the database).
pub async fn unbounded_listing(cx: &CheckContext) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    for endpoint in &cx.config.endpoints {
        if !cx.config.scope.is_in_scope(&endpoint.collection_path) {
            continue;
        }
        let url = format!(
            "{}?limit=100000&size=100000",
            endpoint.collection_url(&cx.config.api_url)
        );
        let response = match cx.client.get(&url).await {
            Ok(response) => response,
            Err(_) => continue,
        };
        if !response.is_success() {
            continue;
        }

        let returned = count_items(&response.body);
        if returned >= 1000 {
            debug!("[Listing] {} returned {} records", endpoint.entity, returned);
            findings.push(
                Finding::new(
                    "Pagination Limit Not Enforced",
                    format!(
                        "The '{}' collection honored an oversized page size and returned \
                         {} records in one response.",
                        endpoint.entity, returned
                    ),
                    Severity::Medium,
                    "Resource Consumption",
                    endpoint.collection_url(&cx.config.api_url),
                    "GET",
                    5.3,
                    "CWE-770",
                    "A04:2021 - Insecure Design",
                )
                .with_parameter("limit")
                .with_payload("limit=100000")
                .with_evidence(format!("{} items in a single page", returned))
                .with_remediation(
                    "Clamp page sizes server-side to a sane maximum and require \
                     cursor-based pagination for bulk access.",
                ),
            );
        }
    }

    Ok(findings)
}

/// Item count of a JSON listing: a bare array or the usual envelopes.
fn count_items(body: &str) -> usize {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return 0,
    };
    if let Some(items) = value.as_array() {
        return items.len();
    }
    for key in ["items", "data", "results", "rows"] {
        if let Some(items) = value.get(key).and_then(|v| v.as_array()) {
            return items.len();
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::offline_context;

    #[test]
    fn test_privileged_field_detection() {
        assert!(privileged_field_stuck(r#"{"id": 7, "role": "admin"}"#));
        assert!(privileged_field_stuck(r#"{"token":"x","user":{"isAdmin":true}}"#));
        assert!(!privileged_field_stuck(r#"{"id": 7, "role": "citizen"}"#));
        assert!(!privileged_field_stuck(r#"{"user":{"isAdmin":false}}"#));
        assert!(!privileged_field_stuck("not json"));
    }

    #[test]
    fn test_count_items_shapes() {
        assert_eq!(count_items(r#"[1,2,3]"#), 3);
        assert_eq!(count_items(r#"{"items": [1,2]}"#), 2);
        assert_eq!(count_items(r#"{"data": []}"#), 0);
        assert_eq!(count_items(r#"{"total": 5}"#), 0);
        assert_eq!(count_items("<html>"), 0);
    }

    #[tokio::test]
    async fn test_checks_quiet_on_dead_target() {
        let cx = offline_context();
        assert!(mass_assignment(&cx).await.unwrap().is_empty());
        assert!(method_tampering(&cx).await.unwrap().is_empty());
        assert!(unbounded_listing(&cx).await.unwrap().is_empty());
    }
}
