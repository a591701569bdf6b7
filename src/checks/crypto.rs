// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Cryptography Checks
 * TLS certificate, protocol and cipher posture
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info};

use super::CheckContext;
use crate::socket_probe::{self, TlsIntrospection};
use crate::types::{Finding, Severity};

/// Certificate expiry window that warrants a heads-up.
const EXPIRY_WARNING_DAYS: i64 = 21;

/// Cipher name fragments that indicate legacy constructions.
const WEAK_CIPHER_MARKERS: &[&str] = &["CBC", "3DES", "RC4", "NULL", "EXPORT"];

/// Handshake with the target and judge what it negotiated. Non-HTTPS
/// targets are covered by the network phase; there is nothing to
/// introspect here.
pub async fn tls_posture(cx: &CheckContext) -> Result<Vec<Finding>> {
    if !cx.target_is_https() {
        debug!("[TLS] Target is not HTTPS - posture check does not apply");
        return Ok(Vec::new());
    }
    let host = match cx.target_host() {
        Some(host) => host,
        None => anyhow::bail!("target URL has no host"),
    };
    let port = cx.target_port().unwrap_or(443);

    let introspection = socket_probe::inspect_tls(
        &host,
        port,
        Duration::from_millis(cx.config.timeout_ms),
    )
    .await?;

    info!(
        "[TLS] {} negotiated {} / {}",
        host, introspection.protocol, introspection.cipher
    );
    Ok(judge_tls(&host, port, &introspection))
}

/// Pure classification of an introspection result, separated from the
/// socket work so the verdict logic is testable offline.
fn judge_tls(host: &str, port: u16, tls: &TlsIntrospection) -> Vec<Finding> {
    let endpoint = format!("{}:{}", host, port);
    let mut findings = Vec::new();

    findings.push(
        Finding::new(
            "Negotiated TLS Parameters",
            "Protocol version and cipher suite the target selected during the \
             introspection handshake.",
            Severity::Info,
            "Transport Security",
            &endpoint,
            "TLS",
            0.0,
            "CWE-326",
            "A02:2021 - Cryptographic Failures",
        )
        .with_evidence(format!("{} / {}", tls.protocol, tls.cipher)),
    );

    if let Some(marker) = WEAK_CIPHER_MARKERS
        .iter()
        .find(|marker| tls.cipher.to_uppercase().contains(**marker))
    {
        findings.push(
            Finding::new(
                "Legacy Cipher Suite Negotiated",
                format!(
                    "The target preferred a {}-based suite over modern AEAD options.",
                    marker
                ),
                Severity::Medium,
                "Transport Security",
                &endpoint,
                "TLS",
                5.9,
                "CWE-327",
                "A02:2021 - Cryptographic Failures",
            )
            .with_evidence(tls.cipher.clone())
            .with_remediation(
                "Restrict the server cipher list to TLS 1.2+ AEAD suites \
                 (AES-GCM, ChaCha20-Poly1305).",
            ),
        );
    }

    let cert = match &tls.certificate {
        Some(cert) => cert,
        None => return findings,
    };

    if cert.is_expired {
        findings.push(
            Finding::new(
                "TLS Certificate Expired or Not Yet Valid",
                "Clients either refuse the connection or have been trained to click \
                 through warnings, which defeats TLS entirely.",
                Severity::High,
                "Transport Security",
                &endpoint,
                "TLS",
                7.4,
                "CWE-295",
                "A02:2021 - Cryptographic Failures",
            )
            .with_evidence(format!(
                "valid {} .. {}, subject {}",
                cert.not_before.format("%Y-%m-%d"),
                cert.not_after.format("%Y-%m-%d"),
                cert.subject
            ))
            .with_remediation("Renew the certificate and automate rotation (ACME)."),
        );
    } else if cert.days_until_expiry <= EXPIRY_WARNING_DAYS {
        findings.push(
            Finding::new(
                "TLS Certificate Expiring Soon",
                format!("{} days of validity remain.", cert.days_until_expiry),
                Severity::Low,
                "Transport Security",
                &endpoint,
                "TLS",
                2.0,
                "CWE-295",
                "A02:2021 - Cryptographic Failures",
            )
            .with_evidence(format!("not_after {}", cert.not_after.format("%Y-%m-%d"))),
        );
    }

    if cert.self_signed {
        findings.push(
            Finding::new(
                "Self-Signed TLS Certificate",
                "Clients cannot distinguish this endpoint from a man-in-the-middle \
                 presenting its own self-signed certificate.",
                Severity::Medium,
                "Transport Security",
                &endpoint,
                "TLS",
                6.5,
                "CWE-295",
                "A02:2021 - Cryptographic Failures",
            )
            .with_evidence(format!("subject == issuer: {}", cert.issuer))
            .with_remediation("Serve a certificate chained to a trusted CA."),
        );
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket_probe::CertificateSummary;
    use chrono::{Duration as ChronoDuration, Utc};

    fn summary(days_left: i64, self_signed: bool) -> CertificateSummary {
        let now = Utc::now();
        CertificateSummary {
            subject: "CN=cible.fr".to_string(),
            issuer: if self_signed {
                "CN=cible.fr".to_string()
            } else {
                "CN=Autorite Exemple".to_string()
            },
            not_before: now - ChronoDuration::days(90),
            not_after: now + ChronoDuration::days(days_left),
            days_until_expiry: days_left,
            is_expired: days_left < 0,
            self_signed,
        }
    }

    fn introspection(cipher: &str, cert: Option<CertificateSummary>) -> TlsIntrospection {
        TlsIntrospection {
            protocol: "TLSv1_3".to_string(),
            cipher: cipher.to_string(),
            certificate: cert,
        }
    }

    #[test]
    fn test_healthy_posture_is_info_only() {
        let tls = introspection("TLS13_AES_256_GCM_SHA384", Some(summary(180, false)));
        let findings = judge_tls("cible.fr", 443, &tls);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Info);
    }

    #[test]
    fn test_expired_certificate_is_high() {
        let tls = introspection("TLS13_AES_256_GCM_SHA384", Some(summary(-3, false)));
        let findings = judge_tls("cible.fr", 443, &tls);
        assert!(findings
            .iter()
            .any(|f| f.severity == Severity::High && f.title.contains("Expired")));
    }

    #[test]
    fn test_expiring_soon_is_low() {
        let tls = introspection("TLS13_AES_256_GCM_SHA384", Some(summary(7, false)));
        let findings = judge_tls("cible.fr", 443, &tls);
        assert!(findings
            .iter()
            .any(|f| f.severity == Severity::Low && f.title.contains("Expiring")));
    }

    #[test]
    fn test_self_signed_flagged() {
        let tls = introspection("TLS13_AES_256_GCM_SHA384", Some(summary(90, true)));
        let findings = judge_tls("cible.fr", 443, &tls);
        assert!(findings.iter().any(|f| f.title.contains("Self-Signed")));
    }

    #[test]
    fn test_cbc_cipher_flagged() {
        let tls = introspection(
            "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384",
            Some(summary(90, false)),
        );
        let findings = judge_tls("cible.fr", 443, &tls);
        assert!(findings.iter().any(|f| f.title.contains("Legacy Cipher")));
    }

    #[tokio::test]
    async fn test_http_target_skips_tls_posture() {
        let cx = crate::checks::testutil::offline_context();
        let findings = tls_posture(&cx).await.unwrap();
        assert!(findings.is_empty());
        assert_eq!(cx.client.stats().sent(), 0);
    }
}
