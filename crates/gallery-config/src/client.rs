//! App-side (client) settings
//!
//! How the app learns the tool's endpoint is up to the host; the environment
//! variable below is only one config source.

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_REGISTRATION_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_MS,
    ENV_GALLERY_TOOL_ENDPOINT,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Configuration of the app-side tooling client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppClientConfig {
    /// Tool endpoint as a `host:port` connection string
    #[serde(default)]
    pub tool_endpoint: Option<String>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Timeout for the `registerApp` call itself
    #[serde(default = "default_register_timeout_ms")]
    pub register_timeout_ms: u64,
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_register_timeout_ms() -> u64 {
    DEFAULT_REGISTRATION_TIMEOUT_MS
}

impl Default for AppClientConfig {
    fn default() -> Self {
        Self {
            tool_endpoint: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            register_timeout_ms: default_register_timeout_ms(),
        }
    }
}

impl AppClientConfig {
    pub fn new(tool_endpoint: impl Into<String>) -> Self {
        Self {
            tool_endpoint: Some(tool_endpoint.into()),
            ..Default::default()
        }
    }

    /// Fill unset fields from the environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| env::var(key).ok())
    }

    /// Fill unset fields from an arbitrary variable source
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.tool_endpoint.is_none() {
            if let Some(endpoint) = lookup(ENV_GALLERY_TOOL_ENDPOINT) {
                if !endpoint.trim().is_empty() {
                    self.tool_endpoint = Some(endpoint);
                }
            }
        }
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn register_timeout(&self) -> Duration {
        Duration::from_millis(self.register_timeout_ms)
    }
}
