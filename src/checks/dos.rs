// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Denial of Service Checks
 * Flood, slowloris, oversized payload and ReDoS probing - gated
 *
 * The whole subsystem is behind the explicit test_dos opt-in. Disabled
 * runs perform zero network traffic and report a single informational
 * skip finding so the report shows the gap.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::CheckContext;
use crate::flood::{bounded_fan_out, judge_degradation, DegradationVerdict, LoadTester};
use crate::heuristics::timing::TimingSample;
use crate::socket_probe::PartialConnection;
use crate::types::{Finding, Severity};

/// Requests per flood batch before the aggressive/stealth modifier.
const FLOOD_VOLUME: usize = 100;

/// Partial connections held open during the slowloris probe.
const SLOWLORIS_CONNECTIONS: usize = 50;

/// How long the partial connections are held before the liveness probe.
const SLOWLORIS_HOLD: Duration = Duration::from_secs(3);

/// Body size for the oversized-payload probe (2MB).
const OVERSIZED_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Entry point for the whole DoS subsystem, registered as one check.
pub async fn run(cx: &CheckContext) -> Result<Vec<Finding>> {
    if !cx.config.scope.test_dos {
        info!("[DoS] Destructive testing disabled - emitting skip notice only");
        return Ok(vec![skip_finding(&cx.config.target_url)]);
    }

    warn!("[DoS] Destructive testing ENABLED against {}", cx.config.target_url);
    let mut findings = Vec::new();
    let tester = LoadTester::new(Arc::clone(&cx.client), cx.config.threads);

    let baseline = match tester.baseline(&cx.config.target_url).await {
        Some(baseline) => baseline,
        None => {
            warn!("[DoS] Could not establish a baseline - aborting flood tests");
            return Ok(findings);
        }
    };
    info!("[DoS] Pre-test baseline latency: {}ms", baseline);

    flood_endpoints(cx, &tester, baseline, &mut findings).await;
    slowloris(cx, &mut findings).await;
    oversized_payload(cx, &mut findings).await;
    regex_backtracking(cx, &mut findings).await;

    // Recovery verification: did the target return to its pre-test
    // performance envelope?
    if tester.verify_recovery(&cx.config.target_url, baseline).await {
        info!("[DoS] Target recovered to pre-test envelope (baseline {}ms)", baseline);
    } else {
        warn!(
            "[DoS] Target has NOT returned to its pre-test envelope (baseline {}ms) - \
             allow time before rerunning and investigate resource exhaustion",
            baseline
        );
    }

    Ok(findings)
}

fn skip_finding(target: &str) -> Finding {
    Finding::new(
        "DoS Tests Skipped",
        "Destructive availability testing was not enabled for this run \
         (scope.testDoS=false); resource-exhaustion posture is unassessed.",
        Severity::Info,
        "Denial of Service",
        target,
        "N/A",
        0.0,
        "CWE-400",
        "A04:2021 - Insecure Design",
    )
    .with_remediation(
        "Re-run with destructive testing explicitly enabled, in a maintenance \
         window, to assess availability behavior under load.",
    )
}

async fn flood_endpoints(
    cx: &CheckContext,
    tester: &LoadTester,
    baseline: u64,
    findings: &mut Vec<Finding>,
) {
    let volume = cx.config.volume(FLOOD_VOLUME);

    for endpoint in &cx.config.endpoints {
        if !cx.config.scope.is_in_scope(&endpoint.collection_path) {
            continue;
        }
        let url = endpoint.collection_url(&cx.config.api_url);
        let stats = tester.flood(&url, volume).await;

        let (title, description, cvss, severity) = match judge_degradation(baseline, &stats) {
            DegradationVerdict::Unresponsive => (
                "Service Unresponsive Under Load",
                format!(
                    "{} concurrent-bounded requests received zero successful responses; \
                     the endpoint stopped answering entirely.",
                    stats.total
                ),
                8.6,
                Severity::High,
            ),
            DegradationVerdict::ErrorSpike { error_rate } => (
                "Error Spike Under Load",
                format!(
                    "{:.0}% of {} requests failed under load; capacity headroom is \
                     insufficient for a modest flood.",
                    error_rate * 100.0,
                    stats.total
                ),
                7.5,
                Severity::High,
            ),
            DegradationVerdict::LatencyInflation { baseline_ms, avg_ms } => (
                "Order-of-Magnitude Latency Inflation Under Load",
                format!(
                    "Average latency rose from {}ms to {}ms under load; a single \
                     client degrades service for everyone.",
                    baseline_ms, avg_ms
                ),
                6.5,
                Severity::Medium,
            ),
            DegradationVerdict::Stable => {
                debug!("[DoS] {} stable under {} requests", endpoint.entity, stats.total);
                continue;
            }
        };

        findings.push(
            Finding::new(
                title,
                description,
                severity,
                "Denial of Service",
                &url,
                "GET",
                cvss,
                "CWE-400",
                "A04:2021 - Insecure Design",
            )
            .with_evidence(format!(
                "{} requests: {} ok / {} errors; latency avg {}ms min {}ms max {}ms \
                 (baseline {}ms)",
                stats.total,
                stats.successes,
                stats.errors,
                stats.avg_latency_ms,
                stats.min_latency_ms,
                stats.max_latency_ms,
                baseline
            ))
            .with_remediation(
                "Add request throttling and connection limits in front of the \
                 application, cache expensive listings, and load-test capacity.",
            ),
        );
    }
}

/// Hold many partial requests open, then check whether an ordinary
/// request still gets through. Every socket closes when the vector drops.
async fn slowloris(cx: &CheckContext, findings: &mut Vec<Finding>) {
    let host = match cx.target_host() {
        Some(host) => host,
        None => return,
    };
    let port = cx.target_port().unwrap_or(80);
    let budget = cx.config.volume(SLOWLORIS_CONNECTIONS);

    info!("[Slowloris] Opening {} partial connections to {}:{}", budget, host, port);
    let jobs: Vec<_> = (0..budget)
        .map(|_| {
            let host = host.clone();
            async move {
                tokio::time::timeout(
                    Duration::from_secs(5),
                    PartialConnection::open(&host, port, "/"),
                )
                .await
                .ok()
                .and_then(|r| r.ok())
            }
        })
        .collect();
    let mut held: Vec<PartialConnection> = bounded_fan_out(cx.config.threads, jobs)
        .await
        .into_iter()
        .flatten()
        .collect();

    if held.is_empty() {
        debug!("[Slowloris] No partial connections could be opened");
        return;
    }
    info!("[Slowloris] Holding {} connections open", held.len());

    for conn in &mut held {
        let _ = conn.feed().await;
    }
    tokio::time::sleep(SLOWLORIS_HOLD).await;

    // Liveness probe while the holdouts are still open.
    let answered = cx
        .client
        .get(&cx.config.target_url)
        .await
        .map(|r| r.status_code < 500)
        .unwrap_or(false);
    let held_count = held.len();
    drop(held); // release every socket before judging

    if !answered {
        findings.push(
            Finding::new(
                "Connection Slots Exhausted by Partial Requests",
                format!(
                    "With {} incomplete requests held open, an ordinary request was \
                     no longer answered; connection slots are finite and unguarded.",
                    held_count
                ),
                Severity::High,
                "Denial of Service",
                &cx.config.target_url,
                "GET",
                7.5,
                "CWE-400",
                "A04:2021 - Insecure Design",
            )
            .with_evidence(format!(
                "{} partial connections held for {:?}; liveness probe failed",
                held_count, SLOWLORIS_HOLD
            ))
            .with_remediation(
                "Enforce header-read timeouts and per-source connection caps at the \
                 reverse proxy (e.g. slowloris protections in nginx/haproxy).",
            ),
        );
    } else {
        debug!("[Slowloris] Target kept answering with {} holdouts open", held_count);
    }
}

/// A create endpoint that swallows a 2MB body without a 413 invites
/// memory exhaustion at scale.
async fn oversized_payload(cx: &CheckContext, findings: &mut Vec<Finding>) {
    let endpoint = match cx.config.endpoint_for("signalements") {
        Some(endpoint) => endpoint,
        None => return,
    };
    let url = endpoint.collection_url(&cx.config.api_url);
    let body = json!({
        "titre": "Audit volumetrie",
        "description": "x".repeat(OVERSIZED_BODY_BYTES),
    });

    let response = match cx.client.post_json(&url, &body).await {
        Ok(response) => response,
        Err(e) => {
            debug!("[DoS] Oversized payload probe failed: {}", e);
            return;
        }
    };

    if response.is_success() {
        findings.push(
            Finding::new(
                "No Request Body Size Limit",
                format!(
                    "A {}MB JSON body was accepted and processed; nothing bounds \
                     per-request memory.",
                    OVERSIZED_BODY_BYTES / (1024 * 1024)
                ),
                Severity::Medium,
                "Denial of Service",
                &url,
                "POST",
                5.3,
                "CWE-400",
                "A04:2021 - Insecure Design",
            )
            .with_evidence(format!("2MB body -> {}", response.status_code))
            .with_remediation(
                "Cap request bodies at the proxy and in the framework body parser \
                 (hundreds of KB is plenty for form submissions).",
            ),
        );
    }
}

/// Catastrophic-backtracking probe: pathological input against the search
/// parameter, judged by the same timing oracle as blind injection.
async fn regex_backtracking(cx: &CheckContext, findings: &mut Vec<Finding>) {
    let endpoint = match cx.config.endpoints.first() {
        Some(endpoint) => endpoint,
        None => return,
    };
    let base = endpoint.collection_url(&cx.config.api_url);
    // Classic evil input for (a+)+-shaped validators.
    let payload = format!("{}!", "a".repeat(40));
    let benign = format!("{}?{}=audit", base, endpoint.search_param);
    let probe = format!("{}?{}={}", base, endpoint.search_param, payload);

    let baseline_a = match cx.client.get(&benign).await {
        Ok(response) => response.duration_ms,
        Err(_) => return,
    };
    let baseline_b = match cx.client.get(&benign).await {
        Ok(response) => response.duration_ms,
        Err(_) => return,
    };

    let probed = match cx.client.get(&probe).await {
        Ok(response) => response.duration_ms,
        // A timeout here IS the signal: the regex never came back.
        Err(_) => cx.config.timeout_ms,
    };

    let sample = TimingSample::with_dual_baseline(baseline_a, baseline_b, probed);
    if sample.indicates_injected_delay() {
        info!("[ReDoS] Pathological input stalled the search endpoint");
        findings.push(
            Finding::new(
                "Regular Expression Denial of Service",
                format!(
                    "A {}-character pathological string stalled the '{}' search for \
                     {}ms against a {}ms baseline; a validation regex backtracks \
                     catastrophically.",
                    payload.len(),
                    endpoint.search_param,
                    sample.probed_ms,
                    sample.baseline_ms
                ),
                Severity::High,
                "Denial of Service",
                &base,
                "GET",
                7.5,
                "CWE-1333",
                "A04:2021 - Insecure Design",
            )
            .with_parameter(&endpoint.search_param)
            .with_payload(payload)
            .with_remediation(
                "Replace nested-quantifier regexes with linear-time patterns or a \
                 non-backtracking engine, and bound input length before matching.",
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::{offline_context, offline_context_with};

    #[tokio::test]
    async fn test_disabled_emits_exactly_one_info_and_zero_requests() {
        let cx = offline_context(); // test_dos defaults to false
        let findings = run(&cx).await.unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
        assert_eq!(findings[0].title, "DoS Tests Skipped");
        assert_eq!(
            cx.client.stats().sent(),
            0,
            "disabled subsystem must generate zero outbound requests"
        );
    }

    #[tokio::test]
    async fn test_enabled_without_baseline_stops_early() {
        let cx = offline_context_with(|config| {
            config.scope.test_dos = true;
        });
        let findings = run(&cx).await.unwrap();
        // Dead target: baseline fails, flood aborted, no skip finding.
        assert!(findings.is_empty());
        assert!(cx.client.stats().sent() >= 1, "baseline probes were attempted");
    }

    #[test]
    fn test_skip_finding_shape() {
        let finding = skip_finding("https://cible.fr");
        assert_eq!(finding.severity, Severity::Info);
        assert!(finding.title.contains("Skipped"));
        assert_eq!(finding.cwe, "CWE-400");
    }
}
