//! Apps manager settings

use crate::constants::{DEFAULT_EVENT_CHANNEL_CAPACITY, DEFAULT_GRACE_PERIOD_MS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// What happens to an App when its last connection closes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppRemovalPolicy {
    /// Remove the App as soon as it has no connections
    Immediate,
    /// Remove it after `grace_period_ms` unless a connection re-registers
    GracePeriod,
    /// Keep it, marked inactive (present-but-possibly-stale)
    #[default]
    Retain,
}

impl AppRemovalPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::GracePeriod => "grace_period",
            Self::Retain => "retain",
        }
    }
}

impl fmt::Display for AppRemovalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppsConfig {
    #[serde(default)]
    pub removal_policy: AppRemovalPolicy,
    /// Only used with `removal_policy = "grace_period"`
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
    /// Buffered events per subscriber before lagging
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

fn default_grace_period_ms() -> u64 {
    DEFAULT_GRACE_PERIOD_MS
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

impl Default for AppsConfig {
    fn default() -> Self {
        Self {
            removal_policy: AppRemovalPolicy::default(),
            grace_period_ms: default_grace_period_ms(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl AppsConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub(crate) fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.event_channel_capacity == 0 {
            errors.push("apps.event_channel_capacity must be greater than 0".to_string());
        }
        if self.removal_policy == AppRemovalPolicy::GracePeriod && self.grace_period_ms == 0 {
            errors.push(
                "apps.grace_period_ms must be greater than 0 when removal_policy = \"grace_period\""
                    .to_string(),
            );
        }
        errors
    }
}
