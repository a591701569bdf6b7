// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Raw Socket Probes
 * TLS introspection and held-open partial connections
 *
 * Two jobs only: (a) connect, read the peer certificate, cipher and
 * negotiated protocol, close; (b) hold a deliberately incomplete HTTP
 * request open for availability testing. Every socket is owned by the
 * check that opened it and is closed on every exit path (drop semantics).
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::net::TcpStream as StdTcpStream;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info};
use x509_parser::prelude::*;

/// Peer certificate summary extracted during introspection.
#[derive(Debug, Clone)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub days_until_expiry: i64,
    pub is_expired: bool,
    pub self_signed: bool,
}

/// Result of a TLS introspection handshake.
#[derive(Debug, Clone)]
pub struct TlsIntrospection {
    pub protocol: String,
    pub cipher: String,
    pub certificate: Option<CertificateSummary>,
}

/// Verifier that accepts any chain. Introspection wants to *read* the
/// certificate of whatever the target presents, including staging and
/// self-signed material; trust decisions are the findings' job.
#[derive(Debug)]
struct IntrospectionVerifier(rustls::crypto::CryptoProvider);

impl ServerCertVerifier for IntrospectionVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

/// Connect, complete a TLS handshake, read peer certificate / cipher /
/// protocol version, close. Blocking I/O moved off the runtime via
/// `spawn_blocking`; the socket lives entirely inside the closure, so it
/// is released on every path including errors.
pub async fn inspect_tls(host: &str, port: u16, timeout: Duration) -> Result<TlsIntrospection> {
    info!("[TLS] Introspecting {}:{}", host, port);
    let host_owned = host.to_string();

    let introspection = tokio::task::spawn_blocking(move || {
        perform_tls_handshake(&host_owned, port, timeout)
    })
    .await
    .context("TLS introspection task panicked")??;

    debug!(
        "[TLS] {}:{} negotiated {} / {}",
        host, port, introspection.protocol, introspection.cipher
    );
    Ok(introspection)
}

fn perform_tls_handshake(host: &str, port: u16, timeout: Duration) -> Result<TlsIntrospection> {
    let provider = rustls::crypto::aws_lc_rs::default_provider();
    let config = rustls::ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(IntrospectionVerifier(provider)))
        .with_no_client_auth();

    let server_name = ServerName::try_from(host.to_string())
        .with_context(|| format!("invalid TLS server name: {}", host))?;
    let mut connection = rustls::ClientConnection::new(Arc::new(config), server_name)
        .context("TLS client construction failed")?;

    let address = format!("{}:{}", host, port);
    let mut socket = StdTcpStream::connect_timeout(
        &address
            .parse()
            .or_else(|_| resolve_first(&address))
            .with_context(|| format!("cannot resolve {}", address))?,
        timeout,
    )
    .with_context(|| format!("TCP connect to {} failed", address))?;
    socket.set_read_timeout(Some(timeout)).ok();
    socket.set_write_timeout(Some(timeout)).ok();

    while connection.is_handshaking() {
        connection
            .complete_io(&mut socket)
            .with_context(|| format!("TLS handshake with {} failed", host))?;
    }

    let protocol = connection
        .protocol_version()
        .map(|v| format!("{:?}", v))
        .unwrap_or_else(|| "unknown".to_string());
    let cipher = connection
        .negotiated_cipher_suite()
        .map(|s| format!("{:?}", s.suite()))
        .unwrap_or_else(|| "unknown".to_string());

    let certificate = connection
        .peer_certificates()
        .and_then(|chain| chain.first())
        .and_then(|der| summarize_certificate(der.as_ref()));

    // Polite close; socket drops regardless of the outcome.
    connection.send_close_notify();
    let _ = connection.complete_io(&mut socket);

    Ok(TlsIntrospection {
        protocol,
        cipher,
        certificate,
    })
}

fn resolve_first(address: &str) -> std::io::Result<std::net::SocketAddr> {
    use std::net::ToSocketAddrs;
    address
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no address"))
}

fn summarize_certificate(der: &[u8]) -> Option<CertificateSummary> {
    let (_, x509) = parse_x509_certificate(der).ok()?;
    let validity = x509.validity();
    let not_before = asn1_to_utc(&validity.not_before);
    let not_after = asn1_to_utc(&validity.not_after);
    let now = Utc::now();
    let subject = x509.subject().to_string();
    let issuer = x509.issuer().to_string();

    Some(CertificateSummary {
        days_until_expiry: not_after.signed_duration_since(now).num_days(),
        is_expired: now < not_before || now > not_after,
        self_signed: subject == issuer,
        subject,
        issuer,
        not_before,
        not_after,
    })
}

fn asn1_to_utc(time: &ASN1Time) -> DateTime<Utc> {
    Utc.timestamp_opt(time.timestamp(), 0)
        .single()
        .unwrap_or_default()
}

/// A deliberately incomplete HTTP request held open against the target.
/// The request head is sent without the terminating blank line, so the
/// server keeps the connection slot allocated waiting for the rest.
/// Dropping the value closes the socket - there is no leak path.
pub struct PartialConnection {
    stream: TcpStream,
    fed: u32,
}

impl PartialConnection {
    pub async fn open(host: &str, port: u16, path: &str) -> std::io::Result<Self> {
        let mut stream = TcpStream::connect((host, port)).await?;
        let head = format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nUser-Agent: Mozilla/5.0\r\nAccept: text/html\r\n",
            path, host
        );
        stream.write_all(head.as_bytes()).await?;
        Ok(Self { stream, fed: 0 })
    }

    /// Write one more header line, keeping the server waiting for the end
    /// of the request head.
    pub async fn feed(&mut self) -> std::io::Result<()> {
        self.fed += 1;
        let line = format!("X-a: {}\r\n", self.fed);
        self.stream.write_all(line.as_bytes()).await
    }

    pub fn headers_fed(&self) -> u32 {
        self.fed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_asn1_epoch_conversion() {
        // ASN1Time at the epoch converts without panicking.
        let time = ASN1Time::from_timestamp(0).unwrap();
        assert_eq!(asn1_to_utc(&time).timestamp(), 0);
    }

    #[tokio::test]
    async fn test_partial_connection_never_completes_request() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut received = Vec::new();
            // Read whatever arrives within a short window.
            loop {
                match tokio::time::timeout(
                    Duration::from_millis(200),
                    socket.read(&mut buf),
                )
                .await
                {
                    Ok(Ok(0)) | Err(_) => break,
                    Ok(Ok(n)) => received.extend_from_slice(&buf[..n]),
                    Ok(Err(_)) => break,
                }
            }
            received
        });

        let mut conn = PartialConnection::open("127.0.0.1", addr.port(), "/").await.unwrap();
        conn.feed().await.unwrap();
        conn.feed().await.unwrap();
        assert_eq!(conn.headers_fed(), 2);
        drop(conn); // closes the socket

        let received = server.await.unwrap();
        let text = String::from_utf8_lossy(&received);
        assert!(text.starts_with("GET / HTTP/1.1\r\n"));
        assert!(text.contains("X-a: 2\r\n"));
        assert!(
            !text.contains("\r\n\r\n"),
            "request head must stay incomplete"
        );
    }

    #[tokio::test]
    async fn test_inspect_tls_reports_connection_failure() {
        // Nothing listens on port 1; the probe must fail with an error,
        // not hang or panic, and must not leave the task wedged.
        let result = inspect_tls("127.0.0.1", 1, Duration::from_millis(300)).await;
        assert!(result.is_err());
    }
}
