use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP edge configuration (`modules.api_ingress` in the app config).
/// The listen address comes from the `server` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiIngressConfig {
    /// Serve `/openapi.json` and the `/docs` viewer.
    #[serde(default = "default_true")]
    pub enable_docs: bool,
    #[serde(default)]
    pub cors_enabled: bool,
    /// Exact origins allowed when CORS is on; empty allows any origin.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

fn default_true() -> bool {
    true
}

fn default_body_limit() -> usize {
    // 1 MiB; request bodies here are small JSON documents.
    1024 * 1024
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            enable_docs: default_true(),
            cors_enabled: false,
            cors_allowed_origins: Vec::new(),
            body_limit_bytes: default_body_limit(),
            request_timeout: default_request_timeout(),
        }
    }
}
