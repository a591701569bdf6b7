// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Timing Oracle Analysis
 * Blind/time-based injection detection from response latency deltas
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use tracing::debug;

/// Delta threshold for a ~5s injected delay. High enough that ordinary
/// jitter cannot reach it, low enough to survive a slow target shaving a
/// few hundred ms off the sleep.
pub const INJECTED_DELAY_THRESHOLD_MS: u64 = 4500;

/// A baseline measurement paired with the delayed probe it anchors.
/// Callers take the baseline immediately before the payload probe so both
/// share network conditions; with two baseline samples the faster one is
/// used, absorbing a one-off jitter spike in the baseline itself.
#[derive(Debug, Clone, Copy)]
pub struct TimingSample {
    pub baseline_ms: u64,
    pub probed_ms: u64,
}

impl TimingSample {
    pub fn new(baseline_ms: u64, probed_ms: u64) -> Self {
        Self {
            baseline_ms,
            probed_ms,
        }
    }

    pub fn with_dual_baseline(first_ms: u64, second_ms: u64, probed_ms: u64) -> Self {
        Self {
            baseline_ms: first_ms.min(second_ms),
            probed_ms,
        }
    }

    pub fn delta_ms(&self) -> u64 {
        self.probed_ms.saturating_sub(self.baseline_ms)
    }

    /// Positive when the payload probe ran long enough over baseline to
    /// indicate the injected delay executed server-side.
    pub fn indicates_injected_delay(&self) -> bool {
        let delta = self.delta_ms();
        let positive = delta >= INJECTED_DELAY_THRESHOLD_MS;
        debug!(
            "[Timing] baseline={}ms probed={}ms delta={}ms -> {}",
            self.baseline_ms,
            self.probed_ms,
            delta,
            if positive { "POSITIVE" } else { "negative" }
        );
        positive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_second_delay_flags_positive() {
        // A full injected sleep against a fast baseline must flag.
        let sample = TimingSample::new(50, 5000);
        assert!(sample.indicates_injected_delay());
    }

    #[test]
    fn test_small_delay_does_not_flag() {
        // A mildly slow response is jitter, not an injected delay.
        let sample = TimingSample::new(50, 100);
        assert!(!sample.indicates_injected_delay());
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(TimingSample::new(0, 4500).indicates_injected_delay());
        assert!(!TimingSample::new(0, 4499).indicates_injected_delay());
    }

    #[test]
    fn test_probe_faster_than_baseline_saturates() {
        // A probe that beats the baseline is never evidence of a delay.
        let sample = TimingSample::new(900, 200);
        assert_eq!(sample.delta_ms(), 0);
        assert!(!sample.indicates_injected_delay());
    }

    #[test]
    fn test_dual_baseline_absorbs_jitter_spike() {
        // One baseline sample hit a 4s network stall; the paired sample
        // did not. The faster baseline keeps the classifier honest.
        let sample = TimingSample::with_dual_baseline(4000, 60, 5100);
        assert_eq!(sample.baseline_ms, 60);
        assert!(sample.indicates_injected_delay());

        // And a genuinely slow target is not flagged just because one
        // baseline was fast relative to an equally slow probe.
        let sample = TimingSample::with_dual_baseline(3900, 3800, 4100);
        assert!(!sample.indicates_injected_delay());
    }
}
