// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Probe Error Taxonomy
 * Distinguishes "attack was blocked" from "network was flaky"
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use std::time::Duration;
use thiserror::Error;

/// Error produced by a single probe against the target. A non-2xx status
/// is NOT an error - callers inspect the status code themselves. These
/// variants only cover transport-level failures, so logs can tell a
/// rejected attack apart from an unreachable host.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    #[error("invalid probe URL: {url}")]
    InvalidUrl { url: String },

    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },
}

impl ProbeError {
    /// Classify a reqwest error into the taxonomy.
    pub fn from_reqwest(url: &str, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeError::Timeout {
                url: url.to_string(),
                timeout,
            }
        } else if err.is_connect() {
            ProbeError::Connect {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else if err.is_builder() || (err.is_request() && err.url().is_none()) {
            ProbeError::InvalidUrl {
                url: url.to_string(),
            }
        } else {
            ProbeError::Transport {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    /// Transient failures are worth one more attempt; a malformed URL is not.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ProbeError::InvalidUrl { .. })
    }
}
