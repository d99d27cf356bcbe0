//! AppManager - one logical App and its live connections
//!
//! The same build may run on several devices at once; each device is one
//! `AppConnection`, and they all share one `AppManager` keyed by project path.
//! The App's catalog is whatever connection reported last (last writer wins).

use crate::connection::AppConnection;
use futures::future::join_all;
use gallery_catalog::CatalogManager;
use gallery_core::{AppEvent, AppId, AppIdentity, ConnectionId, Error, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Per-connection result of a fanned-out navigation
#[derive(Debug, Default)]
pub struct NavigationOutcome {
    pub succeeded: Vec<ConnectionId>,
    pub failed: Vec<(ConnectionId, Error)>,
}

impl NavigationOutcome {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && !self.succeeded.is_empty()
    }
}

pub struct AppManager {
    id: AppId,
    /// Project path as first reported, kept verbatim for display
    project_path: String,
    project_name: String,
    catalog: CatalogManager,
    /// Live connections in registration order
    connections: Mutex<Vec<Arc<AppConnection>>>,
    /// Bumped every time the App loses its last connection
    idle_generation: AtomicU64,
    events: broadcast::Sender<AppEvent>,
}

impl AppManager {
    pub(crate) fn new(identity: &AppIdentity, events: broadcast::Sender<AppEvent>) -> Self {
        Self {
            id: identity.app_id(),
            project_path: identity.project_path.clone(),
            project_name: identity.project_name(),
            catalog: CatalogManager::new(),
            connections: Mutex::new(Vec::new()),
            idle_generation: AtomicU64::new(0),
            events,
        }
    }

    pub fn id(&self) -> &AppId {
        &self.id
    }

    pub fn project_path(&self) -> &str {
        &self.project_path
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Most recently reported catalog, as a queryable manager
    pub fn catalog(&self) -> &CatalogManager {
        &self.catalog
    }

    fn lock_connections(&self) -> MutexGuard<'_, Vec<Arc<AppConnection>>> {
        self.connections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the live connection list
    pub fn connections(&self) -> Vec<Arc<AppConnection>> {
        self.lock_connections().clone()
    }

    pub fn connection(&self, id: ConnectionId) -> Option<Arc<AppConnection>> {
        self.lock_connections().iter().find(|c| c.id() == id).cloned()
    }

    pub fn connection_count(&self) -> usize {
        self.lock_connections().len()
    }

    /// True while at least one connection is live
    pub fn is_active(&self) -> bool {
        self.connection_count() > 0
    }

    pub(crate) fn add_connection(&self, connection: Arc<AppConnection>) {
        let mut connections = self.lock_connections();
        if !connections.iter().any(|c| c.id() == connection.id()) {
            connections.push(connection);
        }
    }

    /// Returns the number of connections left
    pub(crate) fn remove_connection(&self, id: ConnectionId) -> usize {
        let mut connections = self.lock_connections();
        connections.retain(|c| c.id() != id);
        let remaining = connections.len();
        if remaining == 0 {
            self.idle_generation.fetch_add(1, Ordering::SeqCst);
        }
        remaining
    }

    pub(crate) fn idle_generation(&self) -> u64 {
        self.idle_generation.load(Ordering::SeqCst)
    }

    /// Pull the catalog over `connection` and publish it
    ///
    /// Returns the new catalog version.
    #[instrument(
        skip(self, connection),
        fields(app_id = %self.id, connection_id = %connection.id())
    )]
    pub async fn refresh_catalog(&self, connection: &AppConnection) -> Result<u64> {
        let snapshot = connection.get_catalog().await?;
        let components = snapshot.len();
        let version = self.catalog.publish(snapshot);

        info!(version, components, "App catalog updated");
        let _ = self
            .events
            .send(AppEvent::catalog_updated(self.id.clone(), connection.id()));
        Ok(version)
    }

    /// Navigate every live connection to a preview
    ///
    /// The pair is checked against the App's catalog first; an unknown
    /// component or preview fails without any remote call.
    #[instrument(skip(self), fields(app_id = %self.id))]
    pub async fn navigate_to_preview(
        &self,
        component_name: &str,
        preview_name: &str,
    ) -> Result<NavigationOutcome> {
        let catalog = self.catalog.current();
        let (component, preview) = catalog.resolve(component_name, preview_name)?;
        let component_key = component.name().to_string();
        let preview_key = preview.name().to_string();

        let connections = self.connections();
        if connections.is_empty() {
            return Err(Error::ConnectionNotFound(format!(
                "app {} has no live connections",
                self.id
            )));
        }

        let results = join_all(connections.iter().map(|connection| {
            let component = component_key.as_str();
            let preview = preview_key.as_str();
            async move {
                (
                    connection.id(),
                    connection.navigate_to_preview(component, preview).await,
                )
            }
        }))
        .await;

        let mut outcome = NavigationOutcome::default();
        for (id, result) in results {
            match result {
                Ok(()) => outcome.succeeded.push(id),
                Err(e) => {
                    warn!(connection_id = %id, error = %e, "Navigation failed on connection");
                    outcome.failed.push((id, e));
                }
            }
        }

        if outcome.succeeded.is_empty() {
            if let Some((_, first)) = outcome.failed.first() {
                return Err(first.clone());
            }
        }
        debug!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Navigation fanned out"
        );
        Ok(outcome)
    }

    /// Ask the first live connection for a component's previews
    ///
    /// A component unknown to the App's catalog fails locally.
    #[instrument(skip(self), fields(app_id = %self.id))]
    pub async fn get_previews_for_component(&self, component_name: &str) -> Result<Vec<String>> {
        if self.catalog.current().component(component_name).is_none() {
            return Err(Error::component_not_found(component_name));
        }
        self.primary_connection()?
            .get_previews_for_component(component_name)
            .await
    }

    /// Rendered image bytes from the first live connection
    #[instrument(skip(self), fields(app_id = %self.id))]
    pub async fn get_preview_snapshot(
        &self,
        component_name: &str,
        preview_name: &str,
    ) -> Result<Vec<u8>> {
        let catalog = self.catalog.current();
        let (component, preview) = catalog.resolve(component_name, preview_name)?;
        self.primary_connection()?
            .get_preview_snapshot(component.name(), preview.name())
            .await
    }

    fn primary_connection(&self) -> Result<Arc<AppConnection>> {
        self.lock_connections()
            .first()
            .cloned()
            .ok_or_else(|| {
                Error::ConnectionNotFound(format!("app {} has no live connections", self.id))
            })
    }
}

impl std::fmt::Debug for AppManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppManager")
            .field("id", &self.id)
            .field("project_path", &self.project_path)
            .field("connections", &self.connection_count())
            .field("catalog_version", &self.catalog.version())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_core::{CatalogBuilder, Component, Preview, PreviewOrigin};

    fn app() -> AppManager {
        let (events, _) = broadcast::channel(16);
        AppManager::new(&AppIdentity::new("C:\\app\\app.csproj", "Windows"), events)
    }

    #[test]
    fn test_identity_fields() {
        let app = app();
        assert_eq!(app.project_path(), "C:\\app\\app.csproj");
        assert_eq!(app.project_name(), "app");
        assert!(!app.is_active());
        assert!(app.catalog().current().is_empty());
    }

    #[test]
    fn test_connections_deduplicated_and_ordered() {
        let app = app();
        let first = Arc::new(AppConnection::new(ConnectionId(1), None));
        let second = Arc::new(AppConnection::new(ConnectionId(2), None));

        app.add_connection(first.clone());
        app.add_connection(second);
        app.add_connection(first);

        let ids: Vec<ConnectionId> = app.connections().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![ConnectionId(1), ConnectionId(2)]);
    }

    #[test]
    fn test_idle_generation_bumps_on_last_removal() {
        let app = app();
        app.add_connection(Arc::new(AppConnection::new(ConnectionId(1), None)));
        app.add_connection(Arc::new(AppConnection::new(ConnectionId(2), None)));

        assert_eq!(app.remove_connection(ConnectionId(1)), 1);
        assert_eq!(app.idle_generation(), 0);
        assert_eq!(app.remove_connection(ConnectionId(2)), 0);
        assert_eq!(app.idle_generation(), 1);
    }

    #[tokio::test]
    async fn test_navigate_unknown_component_fails_without_rpc() {
        let app = app();
        // Connection has no channel: any remote call would fail with ConnectionClosed
        app.add_connection(Arc::new(AppConnection::new(ConnectionId(1), None)));

        let err = app
            .navigate_to_preview("MyApp.LoginPage", "Default")
            .await
            .unwrap_err();
        assert_eq!(err, Error::ComponentNotFound("MyApp.LoginPage".into()));
    }

    #[tokio::test]
    async fn test_navigate_unknown_preview_fails_without_rpc() {
        let app = app();
        let mut builder = CatalogBuilder::new();
        builder.add_component(Component::new("MyApp.LoginPage")).unwrap();
        app.catalog().publish(builder.build());

        let err = app
            .navigate_to_preview("MyApp.LoginPage", "Default")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PreviewNotFound { .. }));
    }

    #[tokio::test]
    async fn test_navigate_without_connections() {
        let app = app();
        let mut builder = CatalogBuilder::new();
        builder.add_component(Component::new("MyApp.LoginPage")).unwrap();
        builder
            .add_preview(Preview::new(
                "MyApp.LoginPage.Default",
                "MyApp.LoginPage",
                PreviewOrigin::Remote,
            ))
            .unwrap();
        app.catalog().publish(builder.build());

        let err = app
            .navigate_to_preview("MyApp.LoginPage", "Default")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConnectionNotFound(_)));
    }

    #[tokio::test]
    async fn test_navigate_all_failures_returns_first_error() {
        let app = app();
        let mut builder = CatalogBuilder::new();
        builder.add_component(Component::new("MyApp.LoginPage")).unwrap();
        builder
            .add_preview(Preview::new(
                "MyApp.LoginPage.Default",
                "MyApp.LoginPage",
                PreviewOrigin::Remote,
            ))
            .unwrap();
        app.catalog().publish(builder.build());
        app.add_connection(Arc::new(AppConnection::new(ConnectionId(7), None)));

        let err = app
            .navigate_to_preview("MyApp.LoginPage", "Default")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed(_)));
    }
}
