// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Payload Reflection / Storage Detection
 * Did the payload come back verbatim, immediately or on read-back?
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

/// Where a submitted payload resurfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectionKind {
    /// Verbatim in the immediate response to the submission.
    Reflected,
    /// Verbatim in a later read-back of the stored resource.
    Stored,
}

/// Markers that prove the payload landed unescaped in an executable
/// context rather than being entity-encoded on the way out.
const UNESCAPED_MARKERS: &[&str] = &["<script", "onerror=", "onload=", "javascript:"];

/// True when the literal payload, or an unescaped script-bearing fragment
/// of it, appears in the response body. An HTML-encoded echo
/// (`&lt;script&gt;`) is the server doing its job and does not count.
pub fn payload_reflected(body: &str, payload: &str) -> bool {
    if body.contains(payload) {
        return true;
    }
    // Partial survival: the marker fragment made it through unescaped
    // even if the rest of the payload was altered.
    UNESCAPED_MARKERS
        .iter()
        .any(|marker| payload.contains(marker) && body.contains(marker))
}

/// Classify submission + read-back responses. Stored beats reflected when
/// both hold: persistence is the worse outcome.
pub fn classify(
    submit_body: &str,
    readback_body: Option<&str>,
    payload: &str,
) -> Option<ReflectionKind> {
    if let Some(readback) = readback_body {
        if payload_reflected(readback, payload) {
            return Some(ReflectionKind::Stored);
        }
    }
    if payload_reflected(submit_body, payload) {
        return Some(ReflectionKind::Reflected);
    }
    None
}
