//! Connection listener settings

use crate::constants::{
    DEFAULT_LISTENER_HOST, DEFAULT_LISTENER_PORT, DEFAULT_REGISTRATION_TIMEOUT_MS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// TCP listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerConfig {
    /// Bind host (default: 127.0.0.1)
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port; 0 picks an ephemeral port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Accepted sockets that don't register within this window are dropped
    #[serde(default = "default_registration_timeout_ms")]
    pub registration_timeout_ms: u64,
}

fn default_host() -> String {
    DEFAULT_LISTENER_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_LISTENER_PORT
}

fn default_registration_timeout_ms() -> u64 {
    DEFAULT_REGISTRATION_TIMEOUT_MS
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            registration_timeout_ms: default_registration_timeout_ms(),
        }
    }
}

impl ListenerConfig {
    /// `host:port` string to bind
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn registration_timeout(&self) -> Duration {
        Duration::from_millis(self.registration_timeout_ms)
    }

    pub(crate) fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.host.trim().is_empty() {
            errors.push("listener.host must not be empty".to_string());
        }
        if self.registration_timeout_ms == 0 {
            errors.push("listener.registration_timeout_ms must be greater than 0".to_string());
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address_ipv6() {
        let config = ListenerConfig {
            host: "::1".to_string(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(config.bind_address(), "[::1]:9000");
        assert_eq!(ListenerConfig::default().bind_address(), "127.0.0.1:0");
    }
}
