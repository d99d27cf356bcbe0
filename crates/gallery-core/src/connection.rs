//! Connection identifiers, states and public connection info

use crate::AppId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one accepted transport channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

impl From<u64> for ConnectionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Connection lifecycle: `Connecting → Registered → Closed`
///
/// `Connecting → Closed` is also valid (dropped before registering).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Socket accepted, waiting for `RegisterApp`
    Connecting,
    /// Registered and attached to an App
    Registered,
    /// Socket closed or dropped
    Closed,
}

impl ConnectionState {
    /// Get the state as a string (for serialization/display)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Registered => "registered",
            Self::Closed => "closed",
        }
    }

    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Registered)
                | (Self::Connecting, Self::Closed)
                | (Self::Registered, Self::Closed)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of a connection for UI layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    /// Remote socket address, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peer_addr: Option<String>,
    pub state: ConnectionState,
    /// Owning app (set after registration)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<AppId>,
    /// Platform reported at registration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_name: Option<String>,
    /// Accept time (microseconds since epoch)
    pub connected_at: i64,
    /// Registration time (microseconds since epoch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId(7).to_string(), "conn-7");
    }

    #[test]
    fn test_state_transitions() {
        use ConnectionState::*;
        assert!(Connecting.can_transition_to(Registered));
        assert!(Connecting.can_transition_to(Closed));
        assert!(Registered.can_transition_to(Closed));
        assert!(!Registered.can_transition_to(Connecting));
        assert!(!Closed.can_transition_to(Registered));
        assert!(!Closed.can_transition_to(Closed));
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&ConnectionState::Registered).unwrap();
        assert_eq!(json, "\"registered\"");
    }
}
