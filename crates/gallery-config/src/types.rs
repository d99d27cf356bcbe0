//! Top-level configuration

use crate::constants::{
    DEFAULT_LISTENER_HOST, DEFAULT_LISTENER_PORT, DEFAULT_REGISTRATION_TIMEOUT_MS,
    DEFAULT_REQUEST_TIMEOUT_MS, ENV_GALLERY_HOST, ENV_GALLERY_PORT,
    ENV_GALLERY_REGISTRATION_TIMEOUT_MS, ENV_GALLERY_REQUEST_TIMEOUT_MS,
};
use crate::{AppsConfig, ConfigError, ListenerConfig, RpcConfig, ScannerConfig};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

/// Tool-side configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub listener: ListenerConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub apps: AppsConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
}

impl Config {
    /// Check every section, reporting all problems at once
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut all_errors = Vec::new();
        all_errors.extend(self.listener.validate());
        all_errors.extend(self.rpc.validate());
        all_errors.extend(self.apps.validate());

        if all_errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationError(all_errors.join("; ")))
        }
    }

    /// Apply `GALLERY_*` environment overrides to values still at their default
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.listener.host == DEFAULT_LISTENER_HOST {
            if let Some(host) = lookup(ENV_GALLERY_HOST) {
                if !host.trim().is_empty() {
                    self.listener.host = host;
                }
            }
        }

        if self.listener.port == DEFAULT_LISTENER_PORT {
            if let Some(port) = parse_var(&lookup, ENV_GALLERY_PORT) {
                self.listener.port = port;
            }
        }

        if self.listener.registration_timeout_ms == DEFAULT_REGISTRATION_TIMEOUT_MS {
            if let Some(ms) = parse_var(&lookup, ENV_GALLERY_REGISTRATION_TIMEOUT_MS) {
                self.listener.registration_timeout_ms = ms;
            }
        }

        if self.rpc.request_timeout_ms == DEFAULT_REQUEST_TIMEOUT_MS {
            if let Some(ms) = parse_var(&lookup, ENV_GALLERY_REQUEST_TIMEOUT_MS) {
                self.rpc.request_timeout_ms = ms;
            }
        }

        self
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}
