// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - CORS Response Analysis
 * Severity ladder for Access-Control-Allow-* combinations
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::http_client::HttpResponse;
use crate::types::Severity;

/// Verdict for one CORS probe carrying an attacker-controlled Origin.
#[derive(Debug, Clone, PartialEq)]
pub struct CorsVerdict {
    pub severity: Severity,
    pub cvss: f32,
    pub summary: String,
    pub evidence: String,
}

/// Analyze the response to a request that carried `Origin: <test_origin>`.
///
/// Ladder: wildcard origin is High; an exact echo of the attacker origin
/// is Critical; an echo combined with allow-credentials drops to High
/// (browsers refuse `*`+credentials, so the echo without credentials is
/// the wider hole).
pub fn analyze(response: &HttpResponse, test_origin: &str) -> Option<CorsVerdict> {
    let allow_origin = response.header("access-control-allow-origin")?;
    let allow_credentials = response
        .header("access-control-allow-credentials")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if allow_origin == "*" {
        return Some(CorsVerdict {
            severity: Severity::High,
            cvss: 7.5,
            summary: "CORS allows any origin (wildcard)".to_string(),
            evidence: format!("Access-Control-Allow-Origin: {}", allow_origin),
        });
    }

    if allow_origin == test_origin {
        if allow_credentials {
            return Some(CorsVerdict {
                severity: Severity::High,
                cvss: 8.1,
                summary: "CORS reflects arbitrary origin with credentials allowed".to_string(),
                evidence: format!(
                    "Origin: {} echoed back with Access-Control-Allow-Credentials: true",
                    test_origin
                ),
            });
        }
        return Some(CorsVerdict {
            severity: Severity::Critical,
            cvss: 9.1,
            summary: "CORS reflects arbitrary attacker origin".to_string(),
            evidence: format!("Origin: {} echoed back verbatim", test_origin),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const EVIL: &str = "https://evil.example";

    fn response_with(headers: &[(&str, &str)]) -> HttpResponse {
        HttpResponse {
            status_code: 200,
            body: String::new(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            duration_ms: 5,
        }
    }

    #[test]
    fn test_wildcard_is_high() {
        let response = response_with(&[("access-control-allow-origin", "*")]);
        let verdict = analyze(&response, EVIL).unwrap();
        assert_eq!(verdict.severity, Severity::High);
    }

    #[test]
    fn test_reflected_origin_is_critical() {
        let response = response_with(&[("access-control-allow-origin", EVIL)]);
        let verdict = analyze(&response, EVIL).unwrap();
        assert_eq!(verdict.severity, Severity::Critical);
    }

    #[test]
    fn test_reflection_with_credentials_is_high() {
        let response = response_with(&[
            ("access-control-allow-origin", EVIL),
            ("access-control-allow-credentials", "true"),
        ]);
        let verdict = analyze(&response, EVIL).unwrap();
        assert_eq!(verdict.severity, Severity::High);
        assert!(verdict.evidence.contains("Credentials"));
    }

    #[test]
    fn test_pinned_origin_is_clean() {
        let response = response_with(&[(
            "access-control-allow-origin",
            "https://app.cible.fr",
        )]);
        assert!(analyze(&response, EVIL).is_none());
    }

    #[test]
    fn test_no_cors_headers_is_clean() {
        let response = response_with(&[]);
        assert!(analyze(&response, EVIL).is_none());
    }
}
