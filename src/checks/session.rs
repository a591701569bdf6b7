// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Session Management Checks
 * Token predictability, JWT tampering, cookie attributes
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use anyhow::Result;
use serde_json::json;
use tracing::{debug, info};

use super::CheckContext;
use crate::auth::extract_token;
use crate::heuristics::entropy::{self, PredictabilityVerdict};
use crate::heuristics::tokens;
use crate::http_client::bearer;
use crate::types::{Finding, Severity};

/// Fresh logins performed to sample token randomness. These bypass the
/// credential cache on purpose: the cache exists to avoid repeated
/// logins, this check exists to observe them.
const TOKEN_SAMPLES: usize = 3;

/// Sample several freshly issued tokens in quick succession and judge
/// their predictability.
pub async fn token_predictability(cx: &CheckContext) -> Result<Vec<Finding>> {
    let creds = match cx.config.credentials.get("citizen") {
        Some(creds) => creds,
        None => return Ok(Vec::new()),
    };
    let signin = cx.config.signin_url();

    info!("[Session] Sampling {} fresh tokens", TOKEN_SAMPLES);
    let mut samples = Vec::with_capacity(TOKEN_SAMPLES);
    for _ in 0..TOKEN_SAMPLES {
        let body = json!({"email": creds.email, "password": creds.password});
        match cx.client.post_json(&signin, &body).await {
            Ok(response) if response.is_success() => {
                if let Some(token) = extract_token(&response.body) {
                    // For JWTs the signature segment carries the entropy
                    // relevant to guessing; opaque tokens are analyzed whole.
                    let material = token.rsplit('.').next().unwrap_or(&token).to_string();
                    samples.push(material);
                }
            }
            Ok(response) => {
                debug!("[Session] Login for sampling rejected: {}", response.status_code)
            }
            Err(e) => debug!("[Session] Sampling login failed: {}", e),
        }
    }

    if samples.len() < 2 {
        return Ok(Vec::new());
    }

    let mut findings = Vec::new();
    match entropy::analyze(&samples) {
        Some(PredictabilityVerdict::TooShort { shortest }) => {
            findings.push(
                Finding::new(
                    "Session Token Below Minimum Length",
                    format!(
                        "Issued tokens carry as few as {} characters of material; the \
                         keyspace is brute-forceable offline.",
                        shortest
                    ),
                    Severity::High,
                    "Session Management",
                    &signin,
                    "POST",
                    7.5,
                    "CWE-330",
                    "A07:2021 - Identification and Authentication Failures",
                )
                .with_evidence(format!("shortest sample: {} chars (floor: 32)", shortest))
                .with_remediation(
                    "Issue tokens with at least 128 bits of CSPRNG-derived material.",
                ),
            );
        }
        Some(PredictabilityVerdict::Sequential { max_delta }) => {
            findings.push(
                Finding::new(
                    "Sequential Session Identifiers",
                    "Consecutively issued tokens differ by a small numeric step; an \
                     attacker holding one session can compute its neighbors.",
                    Severity::High,
                    "Session Management",
                    &signin,
                    "POST",
                    8.1,
                    "CWE-330",
                    "A07:2021 - Identification and Authentication Failures",
                )
                .with_evidence(format!(
                    "max delta between consecutive samples: {}",
                    max_delta
                ))
                .with_remediation(
                    "Generate identifiers from a CSPRNG, never from counters or clocks.",
                ),
            );
        }
        None => {}
    }

    Ok(findings)
}

/// Forge signature-bypassing variants of a valid token and present each
/// to a protected endpoint. Acceptance of any variant is critical.
pub async fn jwt_tampering(cx: &CheckContext) -> Result<Vec<Finding>> {
    let token = match cx.credentials.get_token("citizen").await {
        Some(token) => token,
        None => return Ok(Vec::new()),
    };
    if !tokens::looks_like_jwt(&token) {
        debug!("[JWT] Token is not JWT-shaped - tamper variants do not apply");
        return Ok(Vec::new());
    }

    let protected = match cx.config.endpoint_for("signalements") {
        Some(endpoint) => endpoint.collection_url(&cx.config.api_url),
        None => return Ok(Vec::new()),
    };

    // Confirm the endpoint actually requires the token; otherwise a 2xx
    // for a forged variant proves nothing.
    if let Ok(anonymous) = cx.client.get(&protected).await {
        if anonymous.is_success() {
            debug!("[JWT] {} serves anonymous requests - cannot judge tampering", protected);
            return Ok(Vec::new());
        }
    }

    let variants = [
        ("alg=none header", tokens::forge_alg_none(&token)),
        ("stripped signature", tokens::forge_signature_stripped(&token)),
        (
            "payload swap (role=admin), original signature",
            tokens::forge_payload_swap(&token, "role", json!("admin")),
        ),
    ];

    let mut findings = Vec::new();
    for (variant_name, forged) in variants {
        let forged = match forged {
            Some(forged) => forged,
            None => continue,
        };
        let response = match cx
            .client
            .get_with_headers(&protected, vec![bearer(&forged)])
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!("[JWT] Variant probe failed: {}", e);
                continue;
            }
        };

        if let Some(finding) =
            judge_tamper_response(variant_name, &protected, response.status_code)
        {
            info!("[JWT] {} accepted at {}", variant_name, protected);
            findings.push(finding.with_payload(forged));
        }
    }

    Ok(findings)
}

/// Verdict for one forged-variant probe. A 401/403 is the verifier doing
/// its job; any 2xx means the signature was never checked.
fn judge_tamper_response(variant: &str, endpoint: &str, status_code: u16) -> Option<Finding> {
    if !(200..300).contains(&status_code) {
        return None;
    }
    Some(
        Finding::new(
            format!("Forged JWT Accepted ({})", variant),
            "A protected endpoint accepted a token whose signature cannot verify; \
             the server is not validating token signatures or algorithms.",
            Severity::Critical,
            "Session Management",
            endpoint,
            "GET",
            9.8,
            "CWE-347",
            "A07:2021 - Identification and Authentication Failures",
        )
        .with_evidence(format!("forged variant ({}) answered {}", variant, status_code))
        .with_remediation(
            "Verify signatures against a pinned algorithm allowlist; reject 'none' \
             and never read the algorithm from the token itself.",
        ),
    )
}

/// Session cookie attribute audit on the responses that set cookies.
pub async fn cookie_flags(cx: &CheckContext) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();
    let mut audited = std::collections::HashSet::new();

    for url in [cx.config.target_url.clone(), cx.config.signin_url()] {
        let response = match cx.client.get(&url).await {
            Ok(response) => response,
            Err(_) => continue,
        };
        let set_cookie = match response.header("set-cookie") {
            Some(set_cookie) => set_cookie.to_string(),
            None => continue,
        };

        let cookie_name = set_cookie.split('=').next().unwrap_or("session").to_string();
        if !audited.insert(cookie_name.clone()) {
            continue;
        }

        let lower = set_cookie.to_lowercase();
        let mut missing = Vec::new();
        if cx.target_is_https() && !lower.contains("secure") {
            missing.push("Secure");
        }
        if !lower.contains("httponly") {
            missing.push("HttpOnly");
        }
        if !lower.contains("samesite") {
            missing.push("SameSite");
        }

        if !missing.is_empty() {
            findings.push(
                Finding::new(
                    "Session Cookie Missing Protective Attributes",
                    format!(
                        "The '{}' cookie is set without {}; it is exposed to script \
                         access and cross-site sending.",
                        cookie_name,
                        missing.join(", ")
                    ),
                    Severity::Medium,
                    "Session Management",
                    &url,
                    "GET",
                    5.4,
                    "CWE-614",
                    "A05:2021 - Security Misconfiguration",
                )
                .with_evidence(set_cookie.chars().take(200).collect::<String>())
                .with_remediation(
                    "Set Secure, HttpOnly and SameSite=Lax (or Strict) on every \
                     session cookie.",
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
    fn test_rejected_tamper_yields_no_finding() {
        assert!(judge_tamper_response("alg=none header", "/api/x", 401).is_none());
        assert!(judge_tamper_response("alg=none header", "/api/x", 403).is_none());
    }

    #[test]
    fn test_accepted_tamper_is_critical_cwe_347() {
        let finding = judge_tamper_response("alg=none header", "/api/x", 200).unwrap();
        assert_eq!(finding.severity, Severity::Critical);
        assert_eq!(finding.cwe, "CWE-347");
        assert!(finding.cvss >= 9.0);
    }

    #[test]
    fn test_redirect_status_is_not_acceptance() {
        assert!(judge_tamper_response("stripped signature", "/api/x", 302).is_none());
    }

    #[tokio::test]
    async fn test_checks_quiet_on_dead_target() {
        let cx = offline_context();
        assert!(token_predictability(&cx).await.unwrap().is_empty());
        assert!(jwt_tampering(&cx).await.unwrap().is_empty());
        assert!(cookie_flags(&cx).await.unwrap().is_empty());
    }
}
