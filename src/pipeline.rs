// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Phase Pipeline
 * Fixed-order phase execution with fail-soft check boundaries
 *
 * Checks are registered as a tagged list of function references per
 * phase - no reflection, no dynamic discovery. A check failure is logged
 * and counts as zero findings; only the orchestrator above this layer is
 * allowed to fail the run.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use anyhow::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{info, warn};

use crate::aggregator::FindingLog;
use crate::checks::{self, CheckContext};
use crate::config::ScopeConfig;
use crate::types::Finding;

/// A check is a plain async function over the shared context.
pub type CheckFn = for<'a> fn(&'a CheckContext) -> BoxFuture<'a, Result<Vec<Finding>>>;

pub struct CheckEntry {
    pub name: &'static str,
    pub run: CheckFn,
}

pub struct Phase {
    pub name: &'static str,
    /// Scope toggle controlling the whole phase.
    pub enabled: fn(&ScopeConfig) -> bool,
    pub checks: Vec<CheckEntry>,
}

fn entry(name: &'static str, run: CheckFn) -> CheckEntry {
    CheckEntry { name, run }
}

fn always(_: &ScopeConfig) -> bool {
    true
}

/// The fixed phase order. Later phases rely on earlier ones only through
/// the credential cache and target-side state; the order itself is part
/// of the contract.
pub fn phases() -> Vec<Phase> {
    vec![
        Phase {
            name: "Reconnaissance",
            enabled: always,
            checks: vec![
                entry("Surface Probe", |cx| checks::recon::surface_probe(cx).boxed()),
                entry("Entity Endpoint Sweep", |cx| checks::recon::endpoint_sweep(cx).boxed()),
            ],
        },
        Phase {
            name: "Network",
            enabled: always,
            checks: vec![
                entry("TCP Reachability", |cx| checks::network::reachability(cx).boxed()),
                entry("Cleartext Exposure", |cx| {
                    checks::network::plain_http_exposure(cx).boxed()
                }),
            ],
        },
        Phase {
            name: "Vulnerability Fingerprinting",
            enabled: always,
            checks: vec![
                entry("Forced Error Analysis", |cx| {
                    checks::fingerprint::forced_errors(cx).boxed()
                }),
                entry("Version Disclosure", |cx| {
                    checks::fingerprint::version_disclosure(cx).boxed()
                }),
            ],
        },
        Phase {
            name: "Web Attacks",
            enabled: always,
            checks: vec![
                entry("Reflected XSS", |cx| checks::web_attacks::reflected_xss(cx).boxed()),
                entry("Stored XSS", |cx| checks::web_attacks::stored_xss(cx).boxed()),
                entry("Open Redirect", |cx| checks::web_attacks::open_redirect(cx).boxed()),
            ],
        },
        Phase {
            name: "API Security",
            enabled: always,
            checks: vec![
                entry("Mass Assignment", |cx| {
                    checks::api_security::mass_assignment(cx).boxed()
                }),
                entry("Method Tampering", |cx| {
                    checks::api_security::method_tampering(cx).boxed()
                }),
                entry("Unbounded Listing", |cx| {
                    checks::api_security::unbounded_listing(cx).boxed()
                }),
            ],
        },
        Phase {
            name: "Authentication",
            enabled: |scope| scope.test_authentication,
            checks: vec![
                entry("Brute Force Throttling", |cx| {
                    checks::authentication::brute_force(cx).boxed()
                }),
                entry("Account Enumeration", |cx| {
                    checks::authentication::user_enumeration(cx).boxed()
                }),
                entry("Rate Limit Bypass", |cx| {
                    checks::authentication::rate_limit_bypass(cx).boxed()
                }),
                entry("Password Policy", |cx| {
                    checks::authentication::weak_password_policy(cx).boxed()
                }),
            ],
        },
        Phase {
            name: "Authorization",
            enabled: |scope| scope.test_authorization,
            checks: vec![
                entry("Object-Level Authorization", |cx| {
                    checks::authorization::bola_sequential_ids(cx).boxed()
                }),
                entry("Vertical Escalation", |cx| {
                    checks::authorization::vertical_escalation(cx).boxed()
                }),
                entry("Missing Authentication", |cx| {
                    checks::authorization::missing_auth(cx).boxed()
                }),
            ],
        },
        Phase {
            name: "Injection",
            enabled: |scope| scope.test_injections,
            checks: vec![
                entry("SQL Injection (Error-Based)", |cx| {
                    checks::injection::sql_error_based(cx).boxed()
                }),
                entry("SQL Injection (Time-Based)", |cx| {
                    checks::injection::sql_time_based(cx).boxed()
                }),
                entry("NoSQL Operator Injection", |cx| {
                    checks::injection::nosql_operator(cx).boxed()
                }),
            ],
        },
        Phase {
            name: "Cryptography",
            enabled: always,
            checks: vec![entry("TLS Posture", |cx| checks::crypto::tls_posture(cx).boxed())],
        },
        Phase {
            name: "Session Management",
            enabled: always,
            checks: vec![
                entry("Token Predictability", |cx| {
                    checks::session::token_predictability(cx).boxed()
                }),
                entry("JWT Tampering", |cx| checks::session::jwt_tampering(cx).boxed()),
                entry("Cookie Attributes", |cx| checks::session::cookie_flags(cx).boxed()),
            ],
        },
        Phase {
            name: "Business Logic",
            enabled: |scope| scope.test_business_logic,
            checks: vec![
                entry("Input Plausibility", |cx| {
                    checks::business_logic::absurd_values(cx).boxed()
                }),
                entry("Duplicate Submission Race", |cx| {
                    checks::business_logic::duplicate_race(cx).boxed()
                }),
                entry("Workflow Tampering", |cx| {
                    checks::business_logic::workflow_tampering(cx).boxed()
                }),
            ],
        },
        Phase {
            // The gate lives inside the check so a disabled run still
            // reports the skip notice.
            name: "Denial of Service",
            enabled: always,
            checks: vec![entry("Availability Testing", |cx| checks::dos::run(cx).boxed())],
        },
        Phase {
            name: "Data Exposure",
            enabled: always,
            checks: vec![
                entry("Leftover Files", |cx| {
                    checks::data_exposure::sensitive_files(cx).boxed()
                }),
                entry("Directory Listing", |cx| {
                    checks::data_exposure::directory_listing(cx).boxed()
                }),
                entry("Bulk Export", |cx| checks::data_exposure::bulk_export(cx).boxed()),
            ],
        },
        Phase {
            name: "Misconfiguration",
            enabled: always,
            checks: vec![
                entry("Security Headers", |cx| {
                    checks::misconfig::security_headers(cx).boxed()
                }),
                entry("CORS Policy", |cx| checks::misconfig::cors_policy(cx).boxed()),
                entry("Dangerous Methods", |cx| {
                    checks::misconfig::dangerous_methods(cx).boxed()
                }),
                entry("Debug Surfaces", |cx| checks::misconfig::debug_endpoints(cx).boxed()),
            ],
        },
    ]
}

/// Run every enabled phase strictly in order, checks sequentially within
/// each phase. Returns the names of the phases that ran.
pub async fn run_phases(cx: &CheckContext, log: &FindingLog) -> Vec<String> {
    let all = phases();
    let total = all.len();
    let mut completed = Vec::with_capacity(total);

    for (index, phase) in all.into_iter().enumerate() {
        if !(phase.enabled)(&cx.config.scope) {
            info!(
                "[Phase {}/{}] {} - disabled by scope, skipping",
                index + 1,
                total,
                phase.name
            );
            continue;
        }

        info!("[Phase {}/{}] {}", index + 1, total, phase.name);
        for check in &phase.checks {
            match (check.run)(cx).await {
                Ok(findings) => {
                    if !findings.is_empty() {
                        info!(
                            "[Check] '{}' produced {} finding(s)",
                            check.name,
                            findings.len()
                        );
                    }
                    log.extend(findings);
                }
                // Check-local failure: a network error or timeout inside
                // one check never aborts the run.
                Err(e) => warn!(
                    "[Check] '{}' failed: {:#} - treated as zero findings",
                    check.name, e
                ),
            }
        }
        completed.push(phase.name.to_string());
    }

    completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::{offline_context, offline_context_with};

    #[test]
    fn test_phase_order_is_fixed() {
        let names: Vec<&str> = phases().iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec![
                "Reconnaissance",
                "Network",
                "Vulnerability Fingerprinting",
                "Web Attacks",
                "API Security",
                "Authentication",
                "Authorization",
                "Injection",
                "Cryptography",
                "Session Management",
                "Business Logic",
                "Denial of Service",
                "Data Exposure",
                "Misconfiguration",
            ]
        );
    }

    #[test]
    fn test_every_phase_has_checks() {
        for phase in phases() {
            assert!(!phase.checks.is_empty(), "phase {} has no checks", phase.name);
        }
    }

    #[test]
    fn test_scope_toggles_gate_the_right_phases() {
        let mut scope = ScopeConfig::default();
        scope.test_authentication = false;
        scope.test_authorization = false;
        scope.test_injections = false;
        scope.test_business_logic = false;

        let gated: Vec<&str> = phases()
            .iter()
            .filter(|p| !(p.enabled)(&scope))
            .map(|p| p.name)
            .collect();
        assert_eq!(
            gated,
            vec!["Authentication", "Authorization", "Injection", "Business Logic"]
        );
    }

    #[tokio::test]
    async fn test_check_failures_never_escape_the_pipeline() {
        // Dead target: several checks return Err internally; the pipeline
        // must swallow all of them and still complete every phase.
        let cx = offline_context();
        let log = FindingLog::new();
        let completed = run_phases(&cx, &log).await;
        assert_eq!(completed.len(), phases().len());
    }

    #[tokio::test]
    async fn test_disabled_phases_are_not_run() {
        let cx = offline_context_with(|config| {
            config.scope.test_authentication = false;
            config.scope.test_injections = false;
        });
        let log = FindingLog::new();
        let completed = run_phases(&cx, &log).await;
        assert!(!completed.contains(&"Authentication".to_string()));
        assert!(!completed.contains(&"Injection".to_string()));
        assert!(completed.contains(&"Authorization".to_string()));
    }

    #[tokio::test]
    async fn test_dos_skip_notice_lands_in_log() {
        let cx = offline_context();
        let log = FindingLog::new();
        run_phases(&cx, &log).await;
        let findings = log.into_findings();
        let skips: Vec<_> = findings
            .iter()
            .filter(|f| f.title == "DoS Tests Skipped")
            .collect();
        assert_eq!(skips.len(), 1);
    }
}
