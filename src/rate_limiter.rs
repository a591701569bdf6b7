// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Client-Side Rate Limiter
 * Fixed-rate request governor protecting fragile targets
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Paces outbound probes at a fixed requests-per-second budget. Shared by
/// every check through the probe client; flood checks hold the same
/// governor so even deliberate load stays within the configured ceiling.
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(rps: u32) -> Self {
        let rps = rps.max(1);
        Self {
            interval: Duration::from_secs_f64(1.0 / rps as f64),
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Wait until the next request slot opens. Slots are handed out in
    /// call order; under fan-out the governor serializes slot handout but
    /// not the requests themselves.
    pub async fn wait_for_slot(&self) {
        let wake_at = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = if *next > now { *next } else { now };
            *next = slot + self.interval;
            slot
        };

        let now = Instant::now();
        if wake_at > now {
            let wait = wake_at - now;
            if wait > Duration::from_millis(250) {
                debug!("[RateLimit] Throttling for {:?}", wait);
            }
            tokio::time::sleep_until(wake_at).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slots_are_spaced() {
        let limiter = RateLimiter::new(100); // 10ms apart
        let start = Instant::now();
        for _ in 0..5 {
            limiter.wait_for_slot().await;
        }
        // First slot is immediate, four more at 10ms spacing.
        assert!(start.elapsed() >= Duration::from_millis(35));
    }

    #[tokio::test]
    async fn test_zero_rps_clamped() {
        // Must not divide by zero or stall forever.
        let limiter = RateLimiter::new(0);
        limiter.wait_for_slot().await;
    }

    #[tokio::test]
    async fn test_concurrent_callers_all_get_slots() {
        let limiter = std::sync::Arc::new(RateLimiter::new(1000));
        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.wait_for_slot().await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
