// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Network Layer Checks
 * TCP reachability and transport encryption posture
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::Result;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info};

use super::CheckContext;
use crate::types::{Finding, Severity};

/// Raw TCP connect to the target port. A target that answers HTTP but not
/// a bare connect (or the reverse) signals middleboxes worth knowing about.
pub async fn reachability(cx: &CheckContext) -> Result<Vec<Finding>> {
    let host = match cx.target_host() {
        Some(host) => host,
        None => anyhow::bail!("target URL has no host"),
    };
    let port = cx.target_port().unwrap_or(80);

    info!("[Network] TCP connect {}:{}", host, port);
    let connect = tokio::time::timeout(
        Duration::from_millis(cx.config.timeout_ms),
        TcpStream::connect((host.as_str(), port)),
    )
    .await;

    // Socket closed by drop on every branch.
    match connect {
        Ok(Ok(stream)) => {
            debug!(
                "[Network] Connected from {:?}",
                stream.local_addr().ok()
            );
            Ok(Vec::new())
        }
        Ok(Err(e)) => anyhow::bail!("TCP connect to {}:{} failed: {}", host, port, e),
        Err(_) => anyhow::bail!("TCP connect to {}:{} timed out", host, port),
    }
}

/// Flag service traffic over plain HTTP. Credentials and bearer tokens on
/// an unencrypted transport are readable by any on-path observer.
pub async fn plain_http_exposure(cx: &CheckContext) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    if cx.target_is_https() {
        // Check the cleartext port for an unredirected twin.
        if let Some(host) = cx.target_host() {
            let http_url = format!("http://{}/", host);
            if let Ok(response) = cx.client.get(&http_url).await {
                if response.status_code == 200 && !response.body.is_empty() {
                    findings.push(
                        Finding::new(
                            "Cleartext HTTP Twin Serves Content",
                            "The application answers on plain HTTP without redirecting to \
                             HTTPS, so a downgraded client session is fully readable on path.",
                            Severity::Medium,
                            "Transport Security",
                            &http_url,
                            "GET",
                            6.5,
                            "CWE-319",
                            "A02:2021 - Cryptographic Failures",
                        )
                        .with_evidence(format!(
                            "GET {} returned 200 with {} bytes instead of a redirect",
                            http_url,
                            response.body.len()
                        ))
                        .with_remediation(
                            "Redirect all port-80 traffic to HTTPS with a 301 and set HSTS \
                             so browsers stop asking.",
                        ),
                    );
                }
            }
        }
        return Ok(findings);
    }

    // The target itself is plain HTTP: the login endpoint carries
    // credentials in cleartext.
    findings.push(
        Finding::new(
            "Authentication Over Unencrypted Transport",
            "The target is served over plain HTTP; the signin endpoint receives \
             email/password pairs and returns bearer tokens in cleartext.",
            Severity::High,
            "Transport Security",
            cx.config.signin_url(),
            "POST",
            8.1,
            "CWE-319",
            "A02:2021 - Cryptographic Failures",
        )
        .with_evidence(format!("target scheme: {}", cx.config.target_url))
        .with_remediation(
            "Terminate TLS in front of the application and refuse to serve the \
             API over port 80. Rotate any credentials that transited cleartext.",
        ),
    );

    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testutil::{offline_context, offline_context_with};

    #[tokio::test]
    async fn test_reachability_fails_on_dead_port() {
        let cx = offline_context();
        assert!(reachability(&cx).await.is_err());
    }

    #[tokio::test]
    async fn test_reachability_succeeds_against_listener() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let cx = offline_context_with(move |config| {
            config.target_url = format!("http://127.0.0.1:{}", port);
        });
        let findings = reachability(&cx).await.unwrap();
        assert!(findings.is_empty());
    }

    #[tokio::test]
    async fn test_plain_http_target_always_flagged() {
        let cx = offline_context();
        let findings = plain_http_exposure(&cx).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].cwe, "CWE-319");
        // No network traffic needed to know http:// is cleartext.
    }

    #[tokio::test]
    async fn test_https_target_with_dead_http_twin_is_clean() {
        let cx = offline_context_with(|config| {
            config.target_url = "https://127.0.0.1:1".to_string();
        });
        let findings = plain_http_exposure(&cx).await.unwrap();
        assert!(findings.is_empty());
    }
}
