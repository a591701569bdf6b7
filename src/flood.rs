// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Flood / Load Subsystem
 * Bounded-concurrency fan-out and degradation verdicts
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::ProbeError;
use crate::http_client::{HttpClient, HttpResponse};

/// Error-rate ceiling under load before the target counts as degraded.
const ERROR_RATE_THRESHOLD: f64 = 0.10;

/// Latency inflation factor (vs baseline) that counts as degradation.
const LATENCY_INFLATION_FACTOR: u64 = 10;

/// Run every job with at most `concurrency` in flight at once and settle
/// the entire batch before returning. Futures are inert until polled, so
/// building the whole vector up front costs nothing; `buffer_unordered`
/// enforces the in-flight ceiling.
pub async fn bounded_fan_out<Fut>(concurrency: usize, jobs: Vec<Fut>) -> Vec<Fut::Output>
where
    Fut: Future,
{
    stream::iter(jobs)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
}

/// Aggregate statistics for one flood batch.
#[derive(Debug, Clone, Default)]
pub struct LoadStats {
    pub total: usize,
    pub successes: usize,
    pub errors: usize,
    pub avg_latency_ms: u64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
}

impl LoadStats {
    pub fn from_results(results: &[Result<HttpResponse, ProbeError>]) -> Self {
        let mut stats = LoadStats {
            total: results.len(),
            min_latency_ms: u64::MAX,
            ..Default::default()
        };
        let mut latency_sum = 0u64;
        let mut latency_count = 0u64;

        for result in results {
            match result {
                Ok(response) if response.status_code < 500 => {
                    stats.successes += 1;
                    latency_sum += response.duration_ms;
                    latency_count += 1;
                    stats.min_latency_ms = stats.min_latency_ms.min(response.duration_ms);
                    stats.max_latency_ms = stats.max_latency_ms.max(response.duration_ms);
                }
                Ok(response) => {
                    // 5xx under load is the server falling over, not a probe result.
                    stats.errors += 1;
                    latency_sum += response.duration_ms;
                    latency_count += 1;
                    stats.max_latency_ms = stats.max_latency_ms.max(response.duration_ms);
                }
                Err(_) => stats.errors += 1,
            }
        }

        if latency_count > 0 {
            stats.avg_latency_ms = latency_sum / latency_count;
        }
        if stats.min_latency_ms == u64::MAX {
            stats.min_latency_ms = 0;
        }
        stats
    }

    pub fn error_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.errors as f64 / self.total as f64
        }
    }
}

/// How the target held up under a flood batch.
#[derive(Debug, Clone, PartialEq)]
pub enum DegradationVerdict {
    /// Zero successful responses: the service stopped answering entirely.
    Unresponsive,
    /// Error rate above the threshold fraction of the load volume.
    ErrorSpike { error_rate: f64 },
    /// Average latency inflated by an order of magnitude over baseline.
    LatencyInflation { baseline_ms: u64, avg_ms: u64 },
    /// No degradation observed.
    Stable,
}

/// Judge one flood batch against the pre-load baseline.
pub fn judge_degradation(baseline_ms: u64, stats: &LoadStats) -> DegradationVerdict {
    if stats.total > 0 && stats.successes == 0 {
        return DegradationVerdict::Unresponsive;
    }
    if stats.error_rate() > ERROR_RATE_THRESHOLD {
        return DegradationVerdict::ErrorSpike {
            error_rate: stats.error_rate(),
        };
    }
    let floor = baseline_ms.max(1);
    if stats.avg_latency_ms >= floor * LATENCY_INFLATION_FACTOR {
        return DegradationVerdict::LatencyInflation {
            baseline_ms,
            avg_ms: stats.avg_latency_ms,
        };
    }
    DegradationVerdict::Stable
}

/// Drives flood batches against target operations through the shared
/// probe client, within the configured concurrency budget.
pub struct LoadTester {
    client: Arc<HttpClient>,
    concurrency: usize,
}

impl LoadTester {
    pub fn new(client: Arc<HttpClient>, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Median of three sequential probes, taken before and after the
    /// destructive batches to bracket the target's performance envelope.
    pub async fn baseline(&self, url: &str) -> Option<u64> {
        let mut latencies = Vec::with_capacity(3);
        for _ in 0..3 {
            if let Ok(response) = self.client.get(url).await {
                latencies.push(response.duration_ms);
            }
        }
        if latencies.is_empty() {
            return None;
        }
        latencies.sort_unstable();
        Some(latencies[latencies.len() / 2])
    }

    /// Fire `volume` GET requests at the URL with bounded concurrency and
    /// settle the whole batch before computing stats.
    pub async fn flood(&self, url: &str, volume: usize) -> LoadStats {
        info!(
            "[Flood] {} requests at concurrency {} -> {}",
            volume, self.concurrency, url
        );
        let jobs: Vec<_> = (0..volume)
            .map(|_| {
                let client = Arc::clone(&self.client);
                let url = url.to_string();
                async move { client.get(&url).await }
            })
            .collect();

        let results = bounded_fan_out(self.concurrency, jobs).await;
        let stats = LoadStats::from_results(&results);
        debug!(
            "[Flood] {}: {}/{} ok, avg {}ms (min {} / max {})",
            url,
            stats.successes,
            stats.total,
            stats.avg_latency_ms,
            stats.min_latency_ms,
            stats.max_latency_ms
        );
        stats
    }

    /// Post-test recovery probe: did the target return to its pre-test
    /// performance envelope (within 3x baseline)?
    pub async fn verify_recovery(&self, url: &str, pre_test_baseline_ms: u64) -> bool {
        match self.baseline(url).await {
            Some(after) => after <= pre_test_baseline_ms.max(1) * 3,
            None => false,
        }
    }
}
