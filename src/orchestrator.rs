// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Audit Orchestrator
 * Owns the run: wiring, phase execution, stats, finalized AuditRun
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::aggregator::FindingLog;
use crate::auth::CredentialManager;
use crate::checks::CheckContext;
use crate::config::AuditConfig;
use crate::http_client::HttpClient;
use crate::pipeline;
use crate::rate_limiter::RateLimiter;
use crate::types::AuditRun;

/// Drives one complete audit. Everything below this layer is fail-soft;
/// an error out of `execute` itself is fatal to the run.
pub struct Orchestrator {
    config: Arc<AuditConfig>,
}

impl Orchestrator {
    pub fn new(config: AuditConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub async fn execute(&self) -> Result<AuditRun> {
        let audit_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        let started_at = chrono::Utc::now().to_rfc3339();

        info!(
            "[Audit {}] Starting against {} (api: {})",
            audit_id, self.config.target_url, self.config.api_url
        );

        let rate_limiter = Arc::new(RateLimiter::new(self.config.rate_limit_rps));
        let client = Arc::new(
            HttpClient::new(self.config.timeout_ms, self.config.max_retries)
                .context("failed to construct probe client")?
                .with_rate_limiter(rate_limiter),
        );
        let stats = client.stats();

        let credentials = Arc::new(CredentialManager::new(
            Arc::clone(&client),
            self.config.signin_url(),
            self.config.credentials.clone(),
        ));

        let cx = CheckContext {
            config: Arc::clone(&self.config),
            client,
            credentials,
        };
        let log = FindingLog::new();

        let phases_completed = pipeline::run_phases(&cx, &log).await;

        let findings = log.into_findings();
        let duration_seconds = started.elapsed().as_secs_f64();
        info!(
            "[Audit {}] Completed: {} phase(s), {} finding(s), {} request(s) \
             ({} failed) in {:.1}s",
            audit_id,
            phases_completed.len(),
            findings.len(),
            stats.sent(),
            stats.failed(),
            duration_seconds
        );

        Ok(AuditRun {
            audit_id,
            target: self.config.target_url.clone(),
            api_url: self.config.api_url.clone(),
            started_at,
            completed_at: chrono::Utc::now().to_rfc3339(),
            duration_seconds,
            findings,
            requests_sent: stats.sent(),
            requests_failed: stats.failed(),
            phases_completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn offline_config() -> AuditConfig {
        let mut config = AuditConfig::load().expect("default config");
        config.target_url = "http://127.0.0.1:1".to_string();
        config.api_url = "http://127.0.0.1:1".to_string();
        config.timeout_ms = 300;
        config.max_retries = 0;
        config.rate_limit_rps = 10_000;
        config
    }

    #[tokio::test]
    async fn test_run_completes_against_dead_target() {
        // Every probe fails, every check degrades to zero findings, and
        // the run still finalizes with consistent bookkeeping.
        let run = Orchestrator::new(offline_config()).execute().await.unwrap();

        assert_eq!(run.phases_completed.len(), pipeline::phases().len());
        assert!(run.requests_sent >= 1);
        assert!(run.duration_seconds >= 0.0);
        assert!(!run.audit_id.is_empty());

        // The only guaranteed findings offline: the cleartext-transport
        // notice and the DoS skip notice.
        assert_eq!(run.count_of(Severity::Info), 1);
        assert!(run
            .findings
            .iter()
            .any(|f| f.title == "DoS Tests Skipped"));
        assert_eq!(
            run.severity_counts().values().sum::<usize>(),
            run.findings.len()
        );
    }
}
