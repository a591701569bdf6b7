// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Credential / Token Manager
 * One login per role per run, cached for every check that needs auth
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::RoleCredentials;
use crate::http_client::HttpClient;

/// Lazily logs in each configured role exactly once and caches the bearer
/// token. Re-authenticating per check would multiply load and can trip the
/// target's own brute-force defenses, poisoning unrelated findings.
pub struct CredentialManager {
    client: Arc<HttpClient>,
    signin_url: String,
    roles: HashMap<String, RoleCredentials>,
    /// role -> Some(token) on success, None cached on failure.
    /// The lock is held across the login probe so two concurrent callers
    /// cannot both fire a login for the same role.
    cache: Mutex<HashMap<String, Option<String>>>,
    login_calls: AtomicU64,
}

impl CredentialManager {
    pub fn new(
        client: Arc<HttpClient>,
        signin_url: String,
        roles: HashMap<String, RoleCredentials>,
    ) -> Self {
        Self {
            client,
            signin_url,
            roles,
            cache: Mutex::new(HashMap::new()),
            login_calls: AtomicU64::new(0),
        }
    }

    /// Bearer token for a role, or None when the role is unconfigured or
    /// its login failed. At most one login request per role per run;
    /// repeated calls return the cached value with no network I/O.
    pub async fn get_token(&self, role: &str) -> Option<String> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.get(role) {
            return cached.clone();
        }

        let creds = match self.roles.get(role) {
            Some(creds) => creds,
            None => {
                debug!("[Auth] No credentials configured for role '{}'", role);
                cache.insert(role.to_string(), None);
                return None;
            }
        };

        self.login_calls.fetch_add(1, Ordering::Relaxed);
        let token = self.login(creds).await;
        match &token {
            Some(_) => info!("[Auth] Obtained token for role '{}'", role),
            None => warn!("[Auth] Login failed for role '{}' - caching the failure", role),
        }
        cache.insert(role.to_string(), token.clone());
        token
    }

    async fn login(&self, creds: &RoleCredentials) -> Option<String> {
        let body = json!({
            "email": creds.email,
            "password": creds.password,
        });

        let response = match self.client.post_json(&self.signin_url, &body).await {
            Ok(response) => response,
            Err(e) => {
                warn!("[Auth] Login probe failed: {}", e);
                return None;
            }
        };

        if !response.is_success() {
            debug!("[Auth] Login rejected with status {}", response.status_code);
            return None;
        }

        extract_token(&response.body)
    }

    /// Number of login requests actually issued this run.
    pub fn login_calls(&self) -> u64 {
        self.login_calls.load(Ordering::Relaxed)
    }

    /// Roles with configured credentials, for checks that iterate roles.
    pub fn configured_roles(&self) -> Vec<String> {
        self.roles.keys().cloned().collect()
    }
}

/// Pull a bearer token out of a login response body. Targets differ in the
/// field name; try the usual suspects, including one level of nesting.
pub fn extract_token(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    const FIELDS: [&str; 5] = ["token", "accessToken", "access_token", "jwt", "bearer"];

    for field in FIELDS {
        if let Some(token) = value.get(field).and_then(|v| v.as_str()) {
            return Some(token.to_string());
        }
    }
    // Common envelope: { "data": { "token": ... } }
    if let Some(data) = value.get("data") {
        for field in FIELDS {
            if let Some(token) = data.get(field).and_then(|v| v.as_str()) {
                return Some(token.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_with_unreachable_target() -> CredentialManager {
        let client = Arc::new(HttpClient::new(300, 0).unwrap());
        let mut roles = HashMap::new();
        roles.insert(
            "citizen".to_string(),
            RoleCredentials {
                email: "citizen@example.fr".to_string(),
                password: "test".to_string(),
            },
        );
        // Port 1: connection refused, so every login fails fast.
        CredentialManager::new(client, "http://127.0.0.1:1/auth/signin".to_string(), roles)
    }

    #[test]
    fn test_extract_token_variants() {
        assert_eq!(
            extract_token(r#"{"token": "abc"}"#),
            Some("abc".to_string())
        );
        assert_eq!(
            extract_token(r#"{"accessToken": "xyz"}"#),
            Some("xyz".to_string())
        );
        assert_eq!(
            extract_token(r#"{"data": {"access_token": "nested"}}"#),
            Some("nested".to_string())
        );
        assert_eq!(extract_token(r#"{"user": "no token here"}"#), None);
        assert_eq!(extract_token("not json"), None);
    }

    #[tokio::test]
    async fn test_failed_login_cached_without_retry() {
        let manager = manager_with_unreachable_target();

        assert_eq!(manager.get_token("citizen").await, None);
        assert_eq!(manager.login_calls(), 1);

        // Second and third calls must be answered from cache.
        assert_eq!(manager.get_token("citizen").await, None);
        assert_eq!(manager.get_token("citizen").await, None);
        assert_eq!(manager.login_calls(), 1, "exactly one login per role per run");
    }

    #[tokio::test]
    async fn test_unknown_role_never_issues_network_call() {
        let manager = manager_with_unreachable_target();
        assert_eq!(manager.get_token("ghost").await, None);
        assert_eq!(manager.login_calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_callers_single_login() {
        let manager = Arc::new(manager_with_unreachable_target());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = Arc::clone(&manager);
            handles.push(tokio::spawn(async move {
                manager.get_token("citizen").await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), None);
        }
        assert_eq!(manager.login_calls(), 1);
    }
}
