// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Audit Checks
 * One module per phase; every check is `async fn(&CheckContext) -> Result<Vec<Finding>>`
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use rand::Rng;
use std::sync::Arc;

use crate::auth::CredentialManager;
use crate::config::AuditConfig;
use crate::http_client::HttpClient;

pub mod api_security;
pub mod authentication;
pub mod authorization;
pub mod business_logic;
pub mod crypto;
pub mod data_exposure;
pub mod dos;
pub mod fingerprint;
pub mod injection;
pub mod misconfig;
pub mod network;
pub mod recon;
pub mod session;
pub mod web_attacks;

/// Everything a check is allowed to touch. Checks are stateless across
/// invocations; all shared state lives behind these handles.
pub struct CheckContext {
    pub config: Arc<AuditConfig>,
    pub client: Arc<HttpClient>,
    pub credentials: Arc<CredentialManager>,
}

impl CheckContext {
    /// Absolute URL under the API base.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// Absolute URL under the target base.
    pub fn target_url(&self, path: &str) -> String {
        format!("{}{}", self.config.target_url.trim_end_matches('/'), path)
    }

    /// Host component of the target URL.
    pub fn target_host(&self) -> Option<String> {
        url::Url::parse(&self.config.target_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
    }

    /// Port of the target URL, honoring scheme defaults.
    pub fn target_port(&self) -> Option<u16> {
        url::Url::parse(&self.config.target_url)
            .ok()
            .and_then(|u| u.port_or_known_default())
    }

    pub fn target_is_https(&self) -> bool {
        self.config.target_url.starts_with("https://")
    }
}

/// Unique per-probe marker so submitted payloads can be recognized on
/// read-back without colliding with real data.
pub fn random_marker(prefix: &str) -> String {
    let mut rng = rand::rng();
    format!("{}-{:08x}", prefix, rng.random::<u32>())
}

/// Unique throwaway mailbox for registration probes.
pub fn random_email() -> String {
    let mut rng = rand::rng();
    format!("audit-{:08x}@exemple-audit.fr", rng.random::<u32>())
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::config::RoleCredentials;
    use std::collections::HashMap;

    /// Context pointing at a dead port: every probe fails fast, which is
    /// exactly what gating/zero-traffic tests need.
    pub fn offline_context() -> CheckContext {
        offline_context_with(|_| {})
    }

    pub fn offline_context_with(mutate: impl FnOnce(&mut AuditConfig)) -> CheckContext {
        let mut config = AuditConfig::load().expect("default config");
        config.target_url = "http://127.0.0.1:1".to_string();
        config.api_url = "http://127.0.0.1:1".to_string();
        config.timeout_ms = 300;
        config.max_retries = 0;
        let mut creds = HashMap::new();
        creds.insert(
            "citizen".to_string(),
            RoleCredentials {
                email: "citizen@exemple-audit.fr".to_string(),
                password: "motdepasse".to_string(),
            },
        );
        config.credentials = creds.clone();
        mutate(&mut config);

        let client = Arc::new(
            HttpClient::new(config.timeout_ms, config.max_retries).expect("client"),
        );
        let credentials = Arc::new(CredentialManager::new(
            Arc::clone(&client),
            config.signin_url(),
            creds,
        ));
        CheckContext {
            config: Arc::new(config),
            client,
            credentials,
        }
    }
}
