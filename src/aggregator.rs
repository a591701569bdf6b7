// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;

use crate::types::{Finding, Severity};

/// Append-only, concurrency-safe collector for findings. Fanned-out
/// batches append from many tasks at once; ordering within a batch is not
/// guaranteed, ordering across checks follows check completion. No
/// deduplication: two checks surfacing the same defect both keep their
/// evidence.
#[derive(Default)]
pub struct FindingLog {
    entries: Mutex<Vec<Finding>>,
}

impl FindingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, finding: Finding) {
        info!(
            "[Finding] {} [{}] {} ({})",
            finding.severity, finding.category, finding.title, finding.endpoint
        );
        self.entries
            .lock()
            .expect("finding log poisoned")
            .push(finding);
    }

    pub fn extend(&self, findings: Vec<Finding>) {
        for finding in findings {
            self.append(finding);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("finding log poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Running tally per severity tier; all tiers present even when zero.
    pub fn severity_counts(&self) -> HashMap<Severity, usize> {
        let entries = self.entries.lock().expect("finding log poisoned");
        let mut counts: HashMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        for finding in entries.iter() {
            *counts.entry(finding.severity).or_insert(0) += 1;
        }
        counts
    }

    /// Consume the log, yielding the findings in append order.
    pub fn into_findings(self) -> Vec<Finding> {
        self.entries.into_inner().expect("finding log poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sample(severity: Severity) -> Finding {
        Finding::new(
            "t",
            "d",
            severity,
            "c",
            "/",
            "GET",
            severity.cvss_band().0,
            "CWE-1",
            "A00",
        )
    }

    #[test]
    fn test_append_preserves_order() {
        let log = FindingLog::new();
        log.append(sample(Severity::High).with_payload("first"));
        log.append(sample(Severity::Low).with_payload("second"));
        let findings = log.into_findings();
        assert_eq!(findings[0].payload.as_deref(), Some("first"));
        assert_eq!(findings[1].payload.as_deref(), Some("second"));
    }

    #[test]
    fn test_no_deduplication() {
        let log = FindingLog::new();
        log.append(sample(Severity::High));
        log.append(sample(Severity::High));
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_appends_lose_nothing() {
        let log = Arc::new(FindingLog::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let log = Arc::clone(&log);
            handles.push(tokio::spawn(async move {
                for _ in 0..25 {
                    log.append(sample(Severity::Info));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(log.len(), 16 * 25);
        let counts = log.severity_counts();
        assert_eq!(counts[&Severity::Info], 16 * 25);
        assert_eq!(counts.values().sum::<usize>(), 16 * 25);
    }
}
