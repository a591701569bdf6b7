// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Authentication Checks
 * Brute-force throttling, enumeration oracles, limiter bypass
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use anyhow::Result;
use serde_json::json;
use tracing::{debug, info};

use super::{random_email, CheckContext};
use crate::heuristics::{enumeration, rate_limit};
use crate::types::{Finding, Severity};

/// Number of consecutive failed logins used to probe throttling.
const BRUTE_FORCE_ATTEMPTS: usize = 20;

/// Attempts per spoofable header when probing limiter bypass.
const BYPASS_ATTEMPTS: usize = 15;

/// Fire a burst of failed logins at the signin endpoint. If none of them
/// is throttled, credential stuffing runs at full line rate.
pub async fn brute_force(cx: &CheckContext) -> Result<Vec<Finding>> {
    let signin = cx.config.signin_url();
    info!(
        "[BruteForce] {} consecutive failed logins against {}",
        BRUTE_FORCE_ATTEMPTS, signin
    );

    let email = random_email();
    let mut status_codes = Vec::with_capacity(BRUTE_FORCE_ATTEMPTS);

    // Sequential on purpose: a per-IP limiter must see an unambiguous
    // consecutive burst from one source.
    for attempt in 0..BRUTE_FORCE_ATTEMPTS {
        let body = json!({"email": email, "password": format!("invalide-{}", attempt)});
        match cx.client.post_json(&signin, &body).await {
            Ok(response) => status_codes.push(response.status_code),
            Err(e) => debug!("[BruteForce] Attempt {} failed: {}", attempt, e),
        }
    }

    if status_codes.is_empty() {
        return Ok(Vec::new());
    }

    let mut findings = Vec::new();
    let verdict = rate_limit::judge("(none)", &status_codes);
    if verdict.bypassed {
        findings.push(
            Finding::new(
                "No Brute Force Protection on Login",
                format!(
                    "{} consecutive failed logins were all processed without a single \
                     429; password guessing is limited only by network bandwidth.",
                    verdict.attempts
                ),
                Severity::High,
                "Brute Force",
                &signin,
                "POST",
                8.1,
                "CWE-307",
                "A07:2021 - Identification and Authentication Failures",
            )
            .with_parameter("password")
            .with_evidence(format!(
                "{} attempts, {} throttled; statuses: {:?}",
                verdict.attempts,
                verdict.throttled,
                &status_codes[..status_codes.len().min(10)]
            ))
            .with_remediation(
                "Rate-limit failed logins per account and per source address, add an \
                 increasing delay after repeated failures, and alert on bursts.",
            ),
        );
    }

    Ok(findings)
}

/// Compare the login failure for a known account (wrong password) against
/// a nonexistent account. Any byte-level difference is an account oracle.
pub async fn user_enumeration(cx: &CheckContext) -> Result<Vec<Finding>> {
    let known_email = match cx
        .config
        .credentials
        .values()
        .next()
        .map(|c| c.email.clone())
    {
        Some(email) => email,
        None => {
            debug!("[Enum] No configured credentials, skipping enumeration probe");
            return Ok(Vec::new());
        }
    };

    let signin = cx.config.signin_url();
    let wrong_password = "mauvais-mot-de-passe-audit";

    let existing = cx
        .client
        .post_json(&signin, &json!({"email": known_email, "password": wrong_password}))
        .await?;
    let missing = cx
        .client
        .post_json(&signin, &json!({"email": random_email(), "password": wrong_password}))
        .await?;

    let mut findings = Vec::new();
    if let Some(diff) = enumeration::compare(&existing, &missing) {
        findings.push(
            Finding::new(
                "Account Enumeration via Login Responses",
                "Failed logins answer differently for existing and nonexistent \
                 accounts, letting an attacker compile a list of valid emails.",
                Severity::Low,
                "Information Disclosure",
                &signin,
                "POST",
                3.7,
                "CWE-204",
                "A07:2021 - Identification and Authentication Failures",
            )
            .with_parameter("email")
            .with_evidence(format!(
                "existing account -> {} / unknown account -> {} (bodies differ: {})",
                diff.status_existing, diff.status_missing, diff.bodies_differ
            ))
            .with_remediation(
                "Return one identical response for every failed login, regardless of \
                 whether the account exists.",
            ),
        );
    }

    Ok(findings)
}

/// When throttling exists, try to defeat it by varying one spoofable
/// client-IP header per batch. Each bypassing header is its own finding.
pub async fn rate_limit_bypass(cx: &CheckContext) -> Result<Vec<Finding>> {
    let signin = cx.config.signin_url();

    // Establish that a limiter exists at all; without one the brute-force
    // check already covers the hole and every "bypass" would be noise.
    let email = random_email();
    let mut baseline_statuses = Vec::new();
    for attempt in 0..BYPASS_ATTEMPTS {
        let body = json!({"email": email, "password": format!("sonde-{}", attempt)});
        if let Ok(response) = cx.client.post_json(&signin, &body).await {
            baseline_statuses.push(response.status_code);
        }
    }
    if baseline_statuses.is_empty() || rate_limit::judge("(none)", &baseline_statuses).bypassed {
        debug!("[RateLimit] No effective limiter observed - bypass probing is moot");
        return Ok(Vec::new());
    }

    info!("[RateLimit] Limiter present; probing spoofable-header bypasses");
    let mut findings = Vec::new();

    for header in rate_limit::SPOOFABLE_IP_HEADERS {
        let email = random_email();
        let mut status_codes = Vec::with_capacity(BYPASS_ATTEMPTS);

        for attempt in 0..BYPASS_ATTEMPTS {
            let body = json!({"email": email, "password": format!("sonde-{}", attempt)});
            let headers = vec![(header.to_string(), rate_limit::spoofed_ip(attempt))];
            match cx.client.post_json_with_headers(&signin, &body, headers).await {
                Ok(response) => status_codes.push(response.status_code),
                Err(e) => debug!("[RateLimit] {} attempt {} failed: {}", header, attempt, e),
            }
        }

        let verdict = rate_limit::judge(header, &status_codes);
        if verdict.bypassed {
            info!("[RateLimit] Limiter bypassed by varying {}", header);
            findings.push(
                Finding::new(
                    format!("Rate Limit Bypass via {}", header),
                    format!(
                        "Varying the {} header resets the login throttle; the limiter \
                         trusts a client-controlled address.",
                        header
                    ),
                    Severity::High,
                    "Brute Force",
                    &signin,
                    "POST",
                    7.5,
                    "CWE-307",
                    "A07:2021 - Identification and Authentication Failures",
                )
                .with_parameter(*header)
                .with_evidence(format!(
                    "{}/{} attempts throttled while rotating {}",
                    verdict.throttled, verdict.attempts, header
                ))
                .with_remediation(
                    "Derive the client address from the socket or from the first \
                     trusted proxy only; never from arbitrary request headers.",
                ),
            );
        }
    }

    Ok(findings)
}

/// Can a trivially weak password register an account?
pub async fn weak_password_policy(cx: &CheckContext) -> Result<Vec<Finding>> {
    let signup = cx.config.signup_url();
    let body = json!({
        "email": random_email(),
        "password": "123456",
        "nom": "Compte Audit",
    });

    let response = match cx.client.post_json(&signup, &body).await {
        Ok(response) => response,
        Err(e) => {
            debug!("[Password] Signup probe failed: {}", e);
            return Ok(Vec::new());
        }
    };

    let mut findings = Vec::new();
    if response.is_success() {
        findings.push(
            Finding::new(
                "Weak Password Accepted at Registration",
                "An account was created with the password '123456'; no complexity or \
                 breach-list policy is enforced.",
                Severity::Medium,
                "Authentication",
                &signup,
                "POST",
                5.3,
                "CWE-521",
                "A07:2021 - Identification and Authentication Failures",
            )
            .with_parameter("password")
            .with_payload("123456")
            .with_evidence(format!("registration returned {}", response.status_code))
            .with_remediation(
                "Enforce a minimum length of 12, reject known-breached passwords, and \
                 rate-limit registration.",
            ),
        );
    }

    Ok(findings)
}
