// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Audit Run Configuration
 * Env-var driven with optional JSON file override; immutable per run
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Credentials for one test role on the target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleCredentials {
    pub email: String,
    pub password: String,
}

/// Endpoint templates for one business entity exposed by the target API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityEndpoints {
    /// Entity name, e.g. "etablissements"
    pub entity: String,
    /// Collection path relative to the API base, e.g. "/api/etablissements"
    pub collection_path: String,
    /// Item path template with `{id}` placeholder, e.g. "/api/etablissements/{id}"
    pub item_path: String,
    /// Query parameter used for free-text search on the collection
    #[serde(default = "default_search_param")]
    pub search_param: String,
}

fn default_search_param() -> String {
    "search".to_string()
}

impl EntityEndpoints {
    pub fn item_url(&self, api_url: &str, id: u64) -> String {
        format!(
            "{}{}",
            api_url.trim_end_matches('/'),
            self.item_path.replace("{id}", &id.to_string())
        )
    }

    pub fn collection_url(&self, api_url: &str) -> String {
        format!("{}{}", api_url.trim_end_matches('/'), self.collection_path)
    }
}

/// Scope boundaries and category toggles for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeConfig {
    #[serde(default)]
    pub include_paths: Vec<String>,
    #[serde(default)]
    pub exclude_paths: Vec<String>,
    #[serde(default = "default_true")]
    pub test_authentication: bool,
    #[serde(default = "default_true")]
    pub test_authorization: bool,
    #[serde(default = "default_true")]
    pub test_injections: bool,
    #[serde(default = "default_true")]
    pub test_business_logic: bool,
    /// Destructive availability testing requires explicit opt-in.
    #[serde(default)]
    pub test_dos: bool,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            include_paths: Vec::new(),
            exclude_paths: Vec::new(),
            test_authentication: true,
            test_authorization: true,
            test_injections: true,
            test_business_logic: true,
            test_dos: false,
        }
    }
}

impl ScopeConfig {
    /// Path-glob scope check. Empty include list means everything is in
    /// scope; exclusions win over inclusions. Globs support `*` within a
    /// segment and a trailing `/*` for subtree matches.
    pub fn is_in_scope(&self, path: &str) -> bool {
        if self.exclude_paths.iter().any(|g| glob_match(g, path)) {
            return false;
        }
        if self.include_paths.is_empty() {
            return true;
        }
        self.include_paths.iter().any(|g| glob_match(g, path))
    }
}

fn glob_match(pattern: &str, path: &str) -> bool {
    if let Some(prefix) = pattern.strip_suffix("/*") {
        return path == prefix || path.starts_with(&format!("{}/", prefix));
    }
    if !pattern.contains('*') {
        return pattern == path;
    }
    // Segment-wise wildcard: split on '*' and require the pieces in order.
    let mut rest = path;
    let parts: Vec<&str> = pattern.split('*').collect();
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        match rest.find(part) {
            Some(pos) => {
                if i == 0 && pos != 0 {
                    return false;
                }
                rest = &rest[pos + part.len()..];
            }
            None => return false,
        }
    }
    if let Some(last) = parts.last() {
        if !last.is_empty() && !pattern.ends_with('*') {
            return path.ends_with(last);
        }
    }
    true
}

/// Immutable configuration for one audit run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditConfig {
    pub target_url: String,
    pub api_url: String,
    #[serde(default)]
    pub aggressive: bool,
    #[serde(default)]
    pub stealth: bool,
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_rps: u32,
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub credentials: HashMap<String, RoleCredentials>,
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<EntityEndpoints>,
    #[serde(default = "default_signin_path")]
    pub signin_path: String,
    #[serde(default = "default_signup_path")]
    pub signup_path: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_true() -> bool {
    true
}

fn default_threads() -> usize {
    10
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    1
}

fn default_rate_limit() -> u32 {
    50
}

fn default_signin_path() -> String {
    "/auth/signin".to_string()
}

fn default_signup_path() -> String {
    "/auth/signup".to_string()
}

fn default_output_dir() -> String {
    "audit-reports".to_string()
}

fn default_endpoints() -> Vec<EntityEndpoints> {
    vec![
        EntityEndpoints {
            entity: "usagers".to_string(),
            collection_path: "/api/usagers".to_string(),
            item_path: "/api/usagers/{id}".to_string(),
            search_param: "search".to_string(),
        },
        EntityEndpoints {
            entity: "etablissements".to_string(),
            collection_path: "/api/etablissements".to_string(),
            item_path: "/api/etablissements/{id}".to_string(),
            search_param: "search".to_string(),
        },
        EntityEndpoints {
            entity: "signalements".to_string(),
            collection_path: "/api/signalements".to_string(),
            item_path: "/api/signalements/{id}".to_string(),
            search_param: "search".to_string(),
        },
    ]
}

impl AuditConfig {
    /// Load configuration: `AUDIT_CONFIG` names a JSON file when set,
    /// individual `AUDIT_*` env vars override on top of it.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("AUDIT_CONFIG") {
            Ok(path) => {
                info!("[Config] Loading configuration file: {}", path);
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("cannot read config file {}", path))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("cannot parse config file {}", path))?
            }
            Err(_) => Self::defaults(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Self {
        Self {
            target_url: "http://localhost:3000".to_string(),
            api_url: "http://localhost:3000".to_string(),
            aggressive: false,
            stealth: false,
            threads: default_threads(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            rate_limit_rps: default_rate_limit(),
            scope: ScopeConfig::default(),
            credentials: HashMap::new(),
            endpoints: default_endpoints(),
            signin_path: default_signin_path(),
            signup_path: default_signup_path(),
            output_dir: default_output_dir(),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("AUDIT_TARGET_URL") {
            self.target_url = v;
        }
        if let Ok(v) = std::env::var("AUDIT_API_URL") {
            self.api_url = v;
        }
        if let Ok(v) = std::env::var("AUDIT_AGGRESSIVE") {
            self.aggressive = v.parse().unwrap_or(self.aggressive);
        }
        if let Ok(v) = std::env::var("AUDIT_STEALTH") {
            self.stealth = v.parse().unwrap_or(self.stealth);
        }
        if let Ok(v) = std::env::var("AUDIT_THREADS") {
            self.threads = v.parse().unwrap_or(self.threads);
        }
        if let Ok(v) = std::env::var("AUDIT_TIMEOUT_MS") {
            self.timeout_ms = v.parse().unwrap_or(self.timeout_ms);
        }
        if let Ok(v) = std::env::var("AUDIT_MAX_RETRIES") {
            self.max_retries = v.parse().unwrap_or(self.max_retries);
        }
        if let Ok(v) = std::env::var("AUDIT_RATE_LIMIT_RPS") {
            self.rate_limit_rps = v.parse().unwrap_or(self.rate_limit_rps);
        }
        if let Ok(v) = std::env::var("AUDIT_TEST_DOS") {
            self.scope.test_dos = v.parse().unwrap_or(self.scope.test_dos);
        }
        if let Ok(v) = std::env::var("AUDIT_OUTPUT_DIR") {
            self.output_dir = v;
        }
        // AUDIT_CREDENTIALS="citizen:a@b.fr:pw,admin:c@d.fr:pw2"
        if let Ok(v) = std::env::var("AUDIT_CREDENTIALS") {
            for entry in v.split(',') {
                let mut parts = entry.splitn(3, ':');
                if let (Some(role), Some(email), Some(password)) =
                    (parts.next(), parts.next(), parts.next())
                {
                    self.credentials.insert(
                        role.trim().to_string(),
                        RoleCredentials {
                            email: email.trim().to_string(),
                            password: password.to_string(),
                        },
                    );
                }
            }
        }
    }

    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.target_url)
            .with_context(|| format!("invalid target URL: {}", self.target_url))?;
        url::Url::parse(&self.api_url)
            .with_context(|| format!("invalid API URL: {}", self.api_url))?;
        if self.threads == 0 || self.threads > 256 {
            anyhow::bail!("thread budget must be within 1..=256, got {}", self.threads);
        }
        if self.timeout_ms < 100 {
            anyhow::bail!("timeout below 100ms would misclassify every probe as timed out");
        }
        if self.rate_limit_rps == 0 {
            anyhow::bail!("rate limit of 0 rps would deadlock the probe client");
        }
        Ok(())
    }

    /// Absolute URL for the login endpoint.
    pub fn signin_url(&self) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), self.signin_path)
    }

    /// Absolute URL for the registration endpoint.
    pub fn signup_url(&self) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), self.signup_path)
    }

    /// Request volume multiplier: aggressive doubles, stealth halves.
    pub fn volume(&self, base: usize) -> usize {
        if self.aggressive {
            base * 2
        } else if self.stealth {
            (base / 2).max(1)
        } else {
            base
        }
    }

    pub fn endpoint_for(&self, entity: &str) -> Option<&EntityEndpoints> {
        self.endpoints.iter().find(|e| e.entity == entity)
    }
}
