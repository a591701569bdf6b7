// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Enumeration Difference Detection
 * Byte-level response comparison for account/resource oracles
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::http_client::HttpResponse;

/// Serialize the parts of a response an attacker can observe: status code
/// plus body. Headers with per-request noise (dates, request IDs) are
/// deliberately excluded from the comparison.
fn observable(response: &HttpResponse) -> String {
    format!("{}\n{}", response.status_code, response.body)
}

/// Result of comparing the known-exists probe against the known-missing one.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumerationDiff {
    pub status_existing: u16,
    pub status_missing: u16,
    pub bodies_differ: bool,
}

/// Any byte-level difference between the two observable responses gives
/// an attacker an existence oracle.
pub fn compare(existing: &HttpResponse, missing: &HttpResponse) -> Option<EnumerationDiff> {
    if observable(existing) == observable(missing) {
        return None;
    }
    Some(EnumerationDiff {
        status_existing: existing.status_code,
        status_missing: missing.status_code,
        bodies_differ: existing.body != missing.body,
    })
}
