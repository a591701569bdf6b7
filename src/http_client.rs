// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - HTTP Probe Client
 * Shared request primitive for every check: non-2xx is data, not an error
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::errors::ProbeError;
use crate::rate_limiter::RateLimiter;

/// Realistic browser User-Agents to avoid trivial bot filtering
const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
];

fn pick_user_agent() -> &'static str {
    use std::sync::atomic::AtomicUsize;
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let index = COUNTER.fetch_add(1, Ordering::Relaxed) % BROWSER_USER_AGENTS.len();
    BROWSER_USER_AGENTS[index]
}

/// Maximum response body retained (10MB) to prevent memory exhaustion
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Redirect ceiling: enough to follow a login bounce, too few to loop
const MAX_REDIRECTS: usize = 3;

/// Wall-clock request counters shared across the whole run. The
/// orchestrator snapshots these into the AuditRun at the end.
#[derive(Debug, Default)]
pub struct RequestStats {
    sent: AtomicU64,
    failed: AtomicU64,
}

impl RequestStats {
    pub fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Outcome of a single probe. Status code is never turned into an error;
/// checks branch on it directly.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
    pub duration_ms: u64,
}

impl HttpResponse {
    pub fn contains(&self, pattern: &str) -> bool {
        self.body.contains(pattern)
    }

    /// Header lookup by lowercase name (reqwest lowercases on receipt).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[derive(Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    timeout: Duration,
    max_retries: u32,
    rate_limiter: Option<Arc<RateLimiter>>,
    stats: Arc<RequestStats>,
}

impl HttpClient {
    pub fn new(timeout_ms: u64, max_retries: u32) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(pick_user_agent())
            .danger_accept_invalid_certs(true) // audit targets run staging certs
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            timeout: Duration::from_millis(timeout_ms),
            max_retries,
            rate_limiter: None,
            stats: Arc::new(RequestStats::default()),
        })
    }

    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    pub fn stats(&self) -> Arc<RequestStats> {
        Arc::clone(&self.stats)
    }

    /// Core request path. Retries transport failures only - a 500 from the
    /// target is a perfectly good probe result and is returned as-is.
    async fn execute(
        &self,
        method: reqwest::Method,
        url: &str,
        headers: &[(String, String)],
        body: Option<RequestBody>,
    ) -> Result<HttpResponse, ProbeError> {
        let mut attempts = 0u32;
        let mut last_error = None;

        while attempts <= self.max_retries {
            if let Some(limiter) = &self.rate_limiter {
                limiter.wait_for_slot().await;
            }

            let mut request = self.client.request(method.clone(), url);
            for (key, value) in headers {
                request = request.header(key, value);
            }
            request = match &body {
                Some(RequestBody::Json(value)) => request
                    .header("Content-Type", "application/json")
                    .body(value.to_string()),
                Some(RequestBody::Form(data)) => request
                    .header("Content-Type", "application/x-www-form-urlencoded")
                    .body(data.clone()),
                Some(RequestBody::Raw(data, content_type)) => request
                    .header("Content-Type", content_type.clone())
                    .body(data.clone()),
                None => request,
            };

            self.stats.record_sent();
            let started = Instant::now();

            match request.send().await {
                Ok(response) => {
                    let status_code = response.status().as_u16();

                    let mut header_map =
                        HashMap::with_capacity(response.headers().len());
                    for (key, value) in response.headers() {
                        if let Ok(value) = value.to_str() {
                            header_map.insert(key.as_str().to_string(), value.to_string());
                        }
                    }

                    let bytes = response.bytes().await.unwrap_or_default();
                    let body = if bytes.len() > MAX_BODY_SIZE {
                        String::from_utf8_lossy(&bytes[..MAX_BODY_SIZE]).to_string()
                    } else {
                        String::from_utf8_lossy(&bytes).to_string()
                    };

                    return Ok(HttpResponse {
                        status_code,
                        body,
                        headers: header_map,
                        duration_ms: started.elapsed().as_millis() as u64,
                    });
                }
                Err(e) => {
                    self.stats.record_failed();
                    let probe_error = ProbeError::from_reqwest(url, self.timeout, e);
                    debug!("[HTTP] Attempt {} failed: {}", attempts + 1, probe_error);
                    if !probe_error.is_retryable() {
                        return Err(probe_error);
                    }
                    last_error = Some(probe_error);
                    attempts += 1;
                    if attempts <= self.max_retries {
                        tokio::time::sleep(Duration::from_millis(100 * attempts as u64)).await;
                    }
                }
            }
        }

        Err(last_error.expect("retry loop exits with at least one error"))
    }

    pub async fn get(&self, url: &str) -> Result<HttpResponse, ProbeError> {
        self.execute(reqwest::Method::GET, url, &[], None).await
    }

    pub async fn get_with_headers(
        &self,
        url: &str,
        headers: Vec<(String, String)>,
    ) -> Result<HttpResponse, ProbeError> {
        self.execute(reqwest::Method::GET, url, &headers, None).await
    }

    pub async fn post_json(
        &self,
        url: &str,
        json: &serde_json::Value,
    ) -> Result<HttpResponse, ProbeError> {
        self.execute(
            reqwest::Method::POST,
            url,
            &[],
            Some(RequestBody::Json(json.clone())),
        )
        .await
    }

    pub async fn post_json_with_headers(
        &self,
        url: &str,
        json: &serde_json::Value,
        headers: Vec<(String, String)>,
    ) -> Result<HttpResponse, ProbeError> {
        self.execute(
            reqwest::Method::POST,
            url,
            &headers,
            Some(RequestBody::Json(json.clone())),
        )
        .await
    }

    pub async fn post_form(
        &self,
        url: &str,
        form_data: &str,
    ) -> Result<HttpResponse, ProbeError> {
        self.execute(
            reqwest::Method::POST,
            url,
            &[],
            Some(RequestBody::Form(form_data.to_string())),
        )
        .await
    }

    pub async fn post_raw(
        &self,
        url: &str,
        body: String,
        content_type: &str,
        headers: Vec<(String, String)>,
    ) -> Result<HttpResponse, ProbeError> {
        self.execute(
            reqwest::Method::POST,
            url,
            &headers,
            Some(RequestBody::Raw(body, content_type.to_string())),
        )
        .await
    }

    pub async fn put_json(
        &self,
        url: &str,
        json: &serde_json::Value,
        headers: Vec<(String, String)>,
    ) -> Result<HttpResponse, ProbeError> {
        self.execute(
            reqwest::Method::PUT,
            url,
            &headers,
            Some(RequestBody::Json(json.clone())),
        )
        .await
    }

    pub async fn patch_json(
        &self,
        url: &str,
        json: &serde_json::Value,
        headers: Vec<(String, String)>,
    ) -> Result<HttpResponse, ProbeError> {
        self.execute(
            reqwest::Method::PATCH,
            url,
            &headers,
            Some(RequestBody::Json(json.clone())),
        )
        .await
    }

    pub async fn delete(
        &self,
        url: &str,
        headers: Vec<(String, String)>,
    ) -> Result<HttpResponse, ProbeError> {
        self.execute(reqwest::Method::DELETE, url, &headers, None).await
    }

    /// Arbitrary method probe (TRACE, OPTIONS, PURGE, ...) for method
    /// tampering checks. Unknown names fall back to GET.
    pub async fn request_with_method(
        &self,
        method: &str,
        url: &str,
        headers: Vec<(String, String)>,
    ) -> Result<HttpResponse, ProbeError> {
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .unwrap_or(reqwest::Method::GET);
        self.execute(method, url, &headers, None).await
    }
}

enum RequestBody {
    Json(serde_json::Value),
    Form(String),
    Raw(String, String),
}

/// Authorization header for a bearer token.
pub fn bearer(token: &str) -> (String, String) {
    ("Authorization".to_string(), format!("Bearer {}", token))
}
