use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Error, Result};

pub const SERVICE_TOKEN_KEY: &str = "service-token";
pub const WS_ADMIN_TOKEN_KEY: &str = "ws-admin-token";
pub const WORKSPACE_URL_KEY: &str = "workspace-url";
pub const FEEDS_URL_KEY: &str = "feeds-url";

#[derive(Clone)]
pub struct NarrativeConfig {
    /// Token the service authenticates with when posting notifications.
    pub service_token: Option<String>,
    /// Token used to read workspace permissions.
    pub ws_admin_token: Option<String>,
    pub workspace_url: Option<String>,
    pub feeds_url: Option<String>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            service_token: None,
            ws_admin_token: None,
            workspace_url: None,
            feeds_url: None,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl NarrativeConfig {
    /// Build a config from the string-keyed map a deployment descriptor hands us.
    /// Unknown keys are ignored.
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).cloned();
        Self {
            service_token: get(SERVICE_TOKEN_KEY),
            ws_admin_token: get(WS_ADMIN_TOKEN_KEY),
            workspace_url: get(WORKSPACE_URL_KEY),
            feeds_url: get(FEEDS_URL_KEY),
            ..Self::default()
        }
    }

    pub fn ws_admin_token(&self) -> Result<&str> {
        require(&self.ws_admin_token, WS_ADMIN_TOKEN_KEY)
    }

    pub fn workspace_url(&self) -> Result<&str> {
        require(&self.workspace_url, WORKSPACE_URL_KEY)
    }

    pub fn feeds_url(&self) -> Result<&str> {
        require(&self.feeds_url, FEEDS_URL_KEY)
    }
}

fn require<'a>(value: &'a Option<String>, key: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| Error::Config(format!("missing configuration key: {key}")))
}

// Tokens must never reach the logs.
impl std::fmt::Debug for NarrativeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("NarrativeConfig")
            .field("service_token", &redact(&self.service_token))
            .field("ws_admin_token", &redact(&self.ws_admin_token))
            .field("workspace_url", &self.workspace_url)
            .field("feeds_url", &self.feeds_url)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}
