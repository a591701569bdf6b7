// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Business Logic Checks
 * Value validation, duplicate-submission races, workflow tampering
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use super::{random_marker, CheckContext};
use crate::flood::bounded_fan_out;
use crate::http_client::bearer;
use crate::types::{Finding, Severity};

/// Concurrent identical submissions fired in the race probe.
const RACE_VOLUME: usize = 10;

/// Values no citizen report should carry. Acceptance means validation
/// lives only in the browser.
pub async fn absurd_values(cx: &CheckContext) -> Result<Vec<Finding>> {
    let endpoint = match cx.config.endpoint_for("signalements") {
        Some(endpoint) => endpoint,
        None => return Ok(Vec::new()),
    };
    let token = cx.credentials.get_token("citizen").await;
    let headers = token.as_deref().map(|t| vec![bearer(t)]).unwrap_or_default();
    let url = endpoint.collection_url(&cx.config.api_url);

    let probes = [
        ("negative priority", json!({"titre": "Audit valeur", "description": "test", "priorite": -5})),
        ("absurd quantity", json!({"titre": "Audit valeur", "description": "test", "nombrePersonnes": 2_000_000_000u32})),
        ("year 1800 date", json!({"titre": "Audit valeur", "description": "test", "dateIncident": "1800-01-01"})),
    ];

    let mut findings = Vec::new();
    for (label, body) in probes {
        let response = match cx
            .client
            .post_json_with_headers(&url, &body, headers.clone())
            .await
        {
            Ok(response) => response,
            Err(_) => continue,
        };
        if response.is_success() {
            info!("[Logic] {} accepted at {}", label, url);
            findings.push(
                Finding::new(
                    "Server Accepts Nonsensical Field Values",
                    format!(
                        "A report with a {} was stored; input validation is not \
                         enforced server-side.",
                        label
                    ),
                    Severity::Medium,
                    "Business Logic",
                    &url,
                    "POST",
                    5.3,
                    "CWE-20",
                    "A04:2021 - Insecure Design",
                )
                .with_payload(body.to_string())
                .with_evidence(format!("{} -> {}", label, response.status_code))
                .with_remediation(
                    "Re-validate every field server-side with domain ranges; client \
                     validation is presentation, not protection.",
                ),
            );
            break; // one demonstration covers the class
        }
    }

    Ok(findings)
}

/// Fire identical create requests concurrently. More than one stored copy
/// means the uniqueness/idempotency rule is enforced after the race
/// window instead of inside it.
pub async fn duplicate_race(cx: &CheckContext) -> Result<Vec<Finding>> {
    let endpoint = match cx.config.endpoint_for("signalements") {
        Some(endpoint) => endpoint,
        None => return Ok(Vec::new()),
    };
    let token = cx.credentials.get_token("citizen").await;
    let headers: Vec<(String, String)> =
        token.as_deref().map(|t| vec![bearer(t)]).unwrap_or_default();
    let url = endpoint.collection_url(&cx.config.api_url);

    let marker = random_marker("race");
    let body = json!({
        "titre": format!("Signalement {}", marker),
        "description": "Soumission dupliquee de test",
        "reference": marker,
    });

    info!("[Race] {} identical submissions against {}", RACE_VOLUME, url);
    let jobs: Vec<_> = (0..RACE_VOLUME)
        .map(|_| {
            let client = Arc::clone(&cx.client);
            let url = url.clone();
            let body = body.clone();
            let headers = headers.clone();
            async move { client.post_json_with_headers(&url, &body, headers).await }
        })
        .collect();

    let results = bounded_fan_out(cx.config.threads, jobs).await;
    let accepted = results
        .iter()
        .filter(|r| r.as_ref().map(|resp| resp.is_success()).unwrap_or(false))
        .count();

    let mut findings = Vec::new();
    if accepted > 1 {
        debug!("[Race] {}/{} concurrent submissions accepted", accepted, RACE_VOLUME);
        findings.push(
            Finding::new(
                "Duplicate Submission Race Window",
                format!(
                    "{} of {} byte-identical concurrent submissions were all stored; \
                     deduplication happens outside the transaction boundary.",
                    accepted, RACE_VOLUME
                ),
                Severity::Medium,
                "Business Logic",
                &url,
                "POST",
                5.9,
                "CWE-362",
                "A04:2021 - Insecure Design",
            )
            .with_payload(body.to_string())
            .with_evidence(format!("{}/{} concurrent 2xx", accepted, RACE_VOLUME))
            .with_remediation(
                "Enforce uniqueness with a database constraint or idempotency key \
                 checked inside the insert transaction.",
            ),
        );
    }

    Ok(findings)
}

/// Jump a report straight to a terminal workflow state as its creator.
/// Status transitions enforced only in the dashboard UI are not enforced.
pub async fn workflow_tampering(cx: &CheckContext) -> Result<Vec<Finding>> {
    let endpoint = match cx.config.endpoint_for("signalements") {
        Some(endpoint) => endpoint,
        None => return Ok(Vec::new()),
    };
    let token = match cx.credentials.get_token("citizen").await {
        Some(token) => token,
        None => return Ok(Vec::new()),
    };
    let url = endpoint.collection_url(&cx.config.api_url);

    // Create a fresh report to tamper with.
    let marker = random_marker("wf");
    let create = cx
        .client
        .post_json_with_headers(
            &url,
            &json!({"titre": format!("Audit {}", marker), "description": "test"}),
            vec![bearer(&token)],
        )
        .await;
    let created_id = match create {
        Ok(response) if response.is_success() => extract_id(&response.body),
        _ => None,
    };
    let id = match created_id {
        Some(id) => id,
        None => {
            debug!("[Workflow] Could not create a probe report - skipping");
            return Ok(Vec::new());
        }
    };

    let item_url = endpoint.item_url(&cx.config.api_url, id);
    let response = match cx
        .client
        .patch_json(
            &item_url,
            &json!({"statut": "CLOTURE", "status": "CLOSED"}),
            vec![bearer(&token)],
        )
        .await
    {
        Ok(response) => response,
        Err(_) => return Ok(Vec::new()),
    };

    let mut findings = Vec::new();
    if response.is_success() {
        info!("[Workflow] Citizen closed their own report via PATCH");
        findings.push(
            Finding::new(
                "Workflow State Transition Not Enforced",
                "A citizen account moved a report directly to the closed state via \
                 PATCH; the review workflow can be skipped entirely.",
                Severity::High,
                "Business Logic",
                &item_url,
                "PATCH",
                7.1,
                "CWE-841",
                "A04:2021 - Insecure Design",
            )
            .with_parameter("statut")
            .with_payload(r#"{"statut":"CLOTURE"}"#)
            .with_evidence(format!("PATCH {} -> {}", item_url, response.status_code))
            .with_remediation(
                "Model allowed state transitions server-side per role and reject \
                 transitions outside the state machine.",
            ),
        );
    }

    Ok(findings)
}

fn extract_id(body: &str) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("id")
        .or_else(|| value.get("data").and_then(|d| d.get("id")))
        .and_then(|id| id.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::offline_context;

    #[test]
    fn test_extract_id_shapes() {
        assert_eq!(extract_id(r#"{"id": 42}"#), Some(42));
        assert_eq!(extract_id(r#"{"data": {"id": 7}}"#), Some(7));
        assert_eq!(extract_id(r#"{"uuid": "abc"}"#), None);
        assert_eq!(extract_id("oops"), None);
    }

    #[tokio::test]
    async fn test_checks_quiet_on_dead_target() {
        let cx = offline_context();
        assert!(absurd_values(&cx).await.unwrap().is_empty());
        assert!(duplicate_race(&cx).await.unwrap().is_empty());
        assert!(workflow_tampering(&cx).await.unwrap().is_empty());
    }
}
