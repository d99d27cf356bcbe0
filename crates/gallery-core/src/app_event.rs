//! App lifecycle events
//!
//! These are the observable surface of the Apps Manager: UI layers subscribe
//! to them instead of polling `apps()` / `connection_count()`.

use crate::{AppId, ConnectionId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Types of app events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppEventKind {
    /// First connection for a previously unseen project path registered
    AppAdded,
    /// App dropped from the apps set
    AppRemoved,
    /// Last connection closed but the app is retained (stale)
    AppInactive,
    /// A connection registered against an app
    ConnectionRegistered,
    /// A registered connection closed
    ConnectionClosed,
    /// The app's catalog was replaced
    CatalogUpdated,
}

impl AppEventKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppAdded => "app_added",
            Self::AppRemoved => "app_removed",
            Self::AppInactive => "app_inactive",
            Self::ConnectionRegistered => "connection_registered",
            Self::ConnectionClosed => "connection_closed",
            Self::CatalogUpdated => "catalog_updated",
        }
    }

    /// Whether the apps set itself changed (as opposed to an app's contents)
    pub fn changes_app_set(&self) -> bool {
        matches!(self, Self::AppAdded | Self::AppRemoved)
    }
}

impl fmt::Display for AppEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An app lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEvent {
    pub kind: AppEventKind,
    pub app_id: AppId,
    /// Connection that caused the event (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<ConnectionId>,
    /// Event timestamp (microseconds since epoch)
    pub timestamp: i64,
}

impl AppEvent {
    /// Create a new event with the current timestamp
    pub fn new(kind: AppEventKind, app_id: AppId) -> Self {
        Self {
            kind,
            app_id,
            connection_id: None,
            timestamp: Utc::now().timestamp_micros(),
        }
    }

    /// Set the connection ID
    pub fn with_connection(mut self, connection_id: ConnectionId) -> Self {
        self.connection_id = Some(connection_id);
        self
    }

    pub fn app_added(app_id: AppId, connection_id: ConnectionId) -> Self {
        Self::new(AppEventKind::AppAdded, app_id).with_connection(connection_id)
    }

    pub fn app_removed(app_id: AppId) -> Self {
        Self::new(AppEventKind::AppRemoved, app_id)
    }

    pub fn app_inactive(app_id: AppId) -> Self {
        Self::new(AppEventKind::AppInactive, app_id)
    }

    pub fn connection_registered(app_id: AppId, connection_id: ConnectionId) -> Self {
        Self::new(AppEventKind::ConnectionRegistered, app_id).with_connection(connection_id)
    }

    pub fn connection_closed(app_id: AppId, connection_id: ConnectionId) -> Self {
        Self::new(AppEventKind::ConnectionClosed, app_id).with_connection(connection_id)
    }

    /// Catalog replaced with the one reported by `connection_id` (last writer wins)
    pub fn catalog_updated(app_id: AppId, connection_id: ConnectionId) -> Self {
        Self::new(AppEventKind::CatalogUpdated, app_id).with_connection(connection_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_serialization() {
        let json = serde_json::to_string(&AppEventKind::CatalogUpdated).unwrap();
        assert_eq!(json, "\"catalog_updated\"");
    }

    #[test]
    fn test_factory_sets_connection() {
        let event = AppEvent::connection_registered(AppId("a".into()), ConnectionId(3));
        assert_eq!(event.kind, AppEventKind::ConnectionRegistered);
        assert_eq!(event.connection_id, Some(ConnectionId(3)));
        assert!(event.timestamp > 0);
    }

    #[test]
    fn test_changes_app_set() {
        assert!(AppEventKind::AppAdded.changes_app_set());
        assert!(AppEventKind::AppRemoved.changes_app_set());
        assert!(!AppEventKind::CatalogUpdated.changes_app_set());
        assert!(!AppEventKind::AppInactive.changes_app_set());
    }
}
