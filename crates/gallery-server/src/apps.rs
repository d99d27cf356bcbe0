//! AppsManager - the authoritative set of Apps
//!
//! One lock guards the App list, and every change to an App's connection
//! list happens while holding it, so registration and disconnect never
//! interleave halfway. Readers get copies (`apps()`), never a guard.
//!
//! What happens when an App loses its last connection is configurable
//! (`AppRemovalPolicy`):
//! - `immediate` - the App is removed at once
//! - `grace_period` - the App is marked inactive and removed after the grace
//!   period unless a connection registers again
//! - `retain` - the App is kept, marked inactive, with its last catalog

use crate::app::AppManager;
use crate::connection::AppConnection;
use gallery_config::{AppRemovalPolicy, AppsConfig};
use gallery_core::{AppEvent, AppId, AppIdentity, Error, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

type AppList = Arc<Mutex<Vec<Arc<AppManager>>>>;

fn lock(apps: &AppList) -> MutexGuard<'_, Vec<Arc<AppManager>>> {
    apps.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn emit(events: &broadcast::Sender<AppEvent>, event: AppEvent) {
    debug!(kind = %event.kind, app_id = %event.app_id, "App event");
    // No subscribers is not an error
    let _ = events.send(event);
}

pub struct AppsManager {
    /// Apps in creation order
    apps: AppList,
    events: broadcast::Sender<AppEvent>,
    removal_policy: AppRemovalPolicy,
    grace_period: Duration,
}

impl AppsManager {
    pub fn new(config: &AppsConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_channel_capacity.max(1));
        Self {
            apps: Arc::new(Mutex::new(Vec::new())),
            events,
            removal_policy: config.removal_policy,
            grace_period: config.grace_period(),
        }
    }

    pub fn removal_policy(&self) -> AppRemovalPolicy {
        self.removal_policy
    }

    /// Snapshot of the current Apps
    pub fn apps(&self) -> Vec<Arc<AppManager>> {
        lock(&self.apps).clone()
    }

    pub fn app(&self, id: &AppId) -> Option<Arc<AppManager>> {
        lock(&self.apps).iter().find(|a| a.id() == id).cloned()
    }

    pub fn require_app(&self, id: &AppId) -> Result<Arc<AppManager>> {
        self.app(id).ok_or_else(|| Error::AppNotFound(id.to_string()))
    }

    /// Look an App up by project path (normalized before comparison)
    pub fn find_by_project_path(&self, project_path: &str) -> Option<Arc<AppManager>> {
        let id = AppIdentity::new(project_path, "").app_id();
        self.app(&id)
    }

    pub fn len(&self) -> usize {
        lock(&self.apps).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.apps).is_empty()
    }

    /// App lifecycle events (added, removed, inactive, connections, catalogs)
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.events.subscribe()
    }

    /// Attach a connection to the App for `identity`, creating the App if needed
    #[instrument(skip(self, connection), fields(connection_id = %connection.id()))]
    pub fn register(
        &self,
        connection: Arc<AppConnection>,
        identity: AppIdentity,
    ) -> Result<Arc<AppManager>> {
        identity.validate().map_err(|reason| {
            Error::ProtocolViolation(format!("invalid registration: {}", reason))
        })?;
        let app_id = identity.app_id();

        let mut apps = lock(&self.apps);
        let existing = apps.iter().find(|a| *a.id() == app_id).cloned();

        // Mark first so a closed or twice-registered connection never joins
        connection.mark_registered(identity.clone(), app_id.clone())?;

        let app = match existing {
            Some(app) => app,
            None => {
                let app = Arc::new(AppManager::new(&identity, self.events.clone()));
                apps.push(Arc::clone(&app));
                info!(
                    app_id = %app_id,
                    project_path = %identity.project_path,
                    "App added"
                );
                emit(&self.events, AppEvent::app_added(app_id.clone(), connection.id()));
                app
            }
        };
        app.add_connection(Arc::clone(&connection));
        drop(apps);

        info!(
            app_id = %app_id,
            platform = %identity.platform_name,
            connections = app.connection_count(),
            "Connection registered"
        );
        emit(
            &self.events,
            AppEvent::connection_registered(app_id, connection.id()),
        );
        Ok(app)
    }

    /// Detach a closed connection and apply the removal policy
    ///
    /// Unregistered connections have no App and are ignored. The lock is
    /// taken before reading the registration so a concurrent `register`
    /// either completes first or sees the connection closed.
    pub fn connection_closed(&self, connection: &AppConnection) {
        let mut apps = lock(&self.apps);
        let Some(app_id) = connection.app_id().cloned() else {
            debug!(connection_id = %connection.id(), "Unregistered connection closed");
            return;
        };

        let Some(position) = apps.iter().position(|a| *a.id() == app_id) else {
            return;
        };
        let app = Arc::clone(&apps[position]);
        if app.connection(connection.id()).is_none() {
            debug!(
                connection_id = %connection.id(),
                app_id = %app_id,
                "Connection never joined app"
            );
            return;
        }
        let remaining = app.remove_connection(connection.id());
        emit(
            &self.events,
            AppEvent::connection_closed(app_id.clone(), connection.id()),
        );
        if remaining > 0 {
            debug!(app_id = %app_id, remaining, "Connection closed, app still active");
            return;
        }

        match self.removal_policy {
            AppRemovalPolicy::Immediate => {
                apps.remove(position);
                info!(app_id = %app_id, "Last connection closed, app removed");
                emit(&self.events, AppEvent::app_removed(app_id));
            }
            AppRemovalPolicy::Retain => {
                info!(app_id = %app_id, "Last connection closed, app retained as inactive");
                emit(&self.events, AppEvent::app_inactive(app_id));
            }
            AppRemovalPolicy::GracePeriod => {
                info!(
                    app_id = %app_id,
                    grace_period_ms = self.grace_period.as_millis() as u64,
                    "Last connection closed, app inactive"
                );
                emit(&self.events, AppEvent::app_inactive(app_id));
                self.schedule_removal(app);
            }
        }
    }

    fn schedule_removal(&self, app: Arc<AppManager>) {
        let generation = app.idle_generation();
        let apps = Arc::clone(&self.apps);
        let events = self.events.clone();
        let grace_period = self.grace_period;

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(app_id = %app.id(), "No runtime for grace-period removal, app retained");
            return;
        };
        runtime.spawn(async move {
            tokio::time::sleep(grace_period).await;

            let mut list = lock(&apps);
            // A connection came back (or went idle again) in the meantime
            if app.is_active() || app.idle_generation() != generation {
                return;
            }
            if let Some(position) = list.iter().position(|a| Arc::ptr_eq(a, &app)) {
                list.remove(position);
                drop(list);
                info!(app_id = %app.id(), "Grace period elapsed, app removed");
                emit(&events, AppEvent::app_removed(app.id().clone()));
            }
        });
    }

    /// Remove an App explicitly (e.g. the user dismissed an inactive App)
    pub fn remove_app(&self, id: &AppId) -> Result<Arc<AppManager>> {
        let mut apps = lock(&self.apps);
        let position = apps
            .iter()
            .position(|a| a.id() == id)
            .ok_or_else(|| Error::AppNotFound(id.to_string()))?;
        let app = apps.remove(position);
        drop(apps);
        emit(&self.events, AppEvent::app_removed(id.clone()));
        Ok(app)
    }
}

impl std::fmt::Debug for AppsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppsManager")
            .field("apps", &self.len())
            .field("removal_policy", &self.removal_policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_core::{AppEventKind, ConnectionId, ConnectionState};

    fn manager(policy: AppRemovalPolicy, grace_period_ms: u64) -> AppsManager {
        AppsManager::new(&AppsConfig {
            removal_policy: policy,
            grace_period_ms,
            ..AppsConfig::default()
        })
    }

    fn connection(id: u64) -> Arc<AppConnection> {
        Arc::new(AppConnection::new(ConnectionId(id), None))
    }

    fn identity(platform: &str) -> AppIdentity {
        AppIdentity::new("C:\\app\\app.csproj", platform)
    }

    fn drain(rx: &mut broadcast::Receiver<AppEvent>) -> Vec<AppEventKind> {
        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.kind);
        }
        kinds
    }

    #[test]
    fn test_register_creates_app() {
        let apps = manager(AppRemovalPolicy::Retain, 0);
        let mut rx = apps.subscribe();

        let app = apps.register(connection(1), identity("Windows")).unwrap();

        assert_eq!(apps.len(), 1);
        assert_eq!(app.connection_count(), 1);
        assert!(apps.find_by_project_path("C:/app/app.csproj").is_some());
        assert_eq!(
            drain(&mut rx),
            vec![AppEventKind::AppAdded, AppEventKind::ConnectionRegistered]
        );
    }

    #[test]
    fn test_second_device_joins_same_app() {
        let apps = manager(AppRemovalPolicy::Retain, 0);
        let first = apps.register(connection(1), identity("Windows")).unwrap();
        let second = apps.register(connection(2), identity("Android")).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(apps.len(), 1);
        assert_eq!(first.connection_count(), 2);
    }

    #[test]
    fn test_invalid_identity_rejected() {
        let apps = manager(AppRemovalPolicy::Retain, 0);
        let conn = connection(1);
        let err = apps
            .register(conn.clone(), AppIdentity::new("  ", "Windows"))
            .unwrap_err();

        assert!(matches!(err, Error::ProtocolViolation(_)));
        assert!(apps.is_empty());
        assert_eq!(conn.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_closed_connection_cannot_register() {
        let apps = manager(AppRemovalPolicy::Retain, 0);
        let conn = connection(1);
        conn.mark_closed();

        assert!(apps.register(conn, identity("Windows")).is_err());
        assert!(apps.is_empty());
    }

    #[test]
    fn test_unregistered_close_has_no_effect() {
        let apps = manager(AppRemovalPolicy::Immediate, 0);
        let mut rx = apps.subscribe();
        apps.connection_closed(&connection(1));
        assert!(apps.is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_immediate_removal() {
        let apps = manager(AppRemovalPolicy::Immediate, 0);
        let conn = connection(1);
        apps.register(conn.clone(), identity("Windows")).unwrap();
        let mut rx = apps.subscribe();

        apps.connection_closed(&conn);

        assert!(apps.is_empty());
        assert_eq!(
            drain(&mut rx),
            vec![AppEventKind::ConnectionClosed, AppEventKind::AppRemoved]
        );
    }

    #[test]
    fn test_retain_keeps_inactive_app() {
        let apps = manager(AppRemovalPolicy::Retain, 0);
        let conn = connection(1);
        let app = apps.register(conn.clone(), identity("Windows")).unwrap();
        let mut rx = apps.subscribe();

        apps.connection_closed(&conn);

        assert_eq!(apps.len(), 1);
        assert!(!app.is_active());
        assert_eq!(
            drain(&mut rx),
            vec![AppEventKind::ConnectionClosed, AppEventKind::AppInactive]
        );
    }

    #[test]
    fn test_app_stays_while_other_connection_live() {
        let apps = manager(AppRemovalPolicy::Immediate, 0);
        let first = connection(1);
        apps.register(first.clone(), identity("Windows")).unwrap();
        apps.register(connection(2), identity("Android")).unwrap();

        apps.connection_closed(&first);

        assert_eq!(apps.len(), 1);
        assert_eq!(apps.apps()[0].connection_count(), 1);
    }

    #[tokio::test]
    async fn test_grace_period_removal() {
        let apps = manager(AppRemovalPolicy::GracePeriod, 20);
        let conn = connection(1);
        apps.register(conn.clone(), identity("Windows")).unwrap();

        apps.connection_closed(&conn);
        assert_eq!(apps.len(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(apps.is_empty());
    }

    #[tokio::test]
    async fn test_grace_period_cancelled_by_reconnect() {
        let apps = manager(AppRemovalPolicy::GracePeriod, 50);
        let conn = connection(1);
        apps.register(conn.clone(), identity("Windows")).unwrap();
        apps.connection_closed(&conn);

        apps.register(connection(2), identity("Windows")).unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(apps.len(), 1);
        assert!(apps.apps()[0].is_active());
    }

    #[test]
    fn test_register_racing_close_never_leaves_closed_connection_attached() {
        use std::sync::Barrier;

        let apps = Arc::new(manager(AppRemovalPolicy::Retain, 0));
        for id in 1..=500 {
            let conn = connection(id);
            let barrier = Arc::new(Barrier::new(2));

            let registering = {
                let (apps, conn, barrier) = (apps.clone(), conn.clone(), barrier.clone());
                std::thread::spawn(move || {
                    barrier.wait();
                    let _ = apps.register(conn, identity("Windows"));
                })
            };
            let closing = {
                let (apps, conn, barrier) = (apps.clone(), conn.clone(), barrier.clone());
                std::thread::spawn(move || {
                    barrier.wait();
                    conn.mark_closed();
                    apps.connection_closed(&conn);
                })
            };
            registering.join().unwrap();
            closing.join().unwrap();

            assert_eq!(conn.state(), ConnectionState::Closed);
            for app in apps.apps() {
                assert!(
                    app.connection(conn.id()).is_none(),
                    "closed connection {} still attached",
                    id
                );
                assert!(!app.is_active());
            }
        }
    }

    #[test]
    fn test_close_of_connection_outside_app_keeps_idle_state() {
        let apps = manager(AppRemovalPolicy::Retain, 0);
        let first = connection(1);
        let app = apps.register(first.clone(), identity("Windows")).unwrap();
        apps.connection_closed(&first);
        let generation = app.idle_generation();

        // Registered against the app id but never added to its connection list
        let stray = connection(2);
        stray
            .mark_registered(identity("Android"), app.id().clone())
            .unwrap();
        stray.mark_closed();
        let mut rx = apps.subscribe();
        apps.connection_closed(&stray);

        assert_eq!(app.idle_generation(), generation);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_remove_app() {
        let apps = manager(AppRemovalPolicy::Retain, 0);
        let app = apps.register(connection(1), identity("Windows")).unwrap();

        apps.remove_app(app.id()).unwrap();
        assert!(apps.is_empty());
        assert!(matches!(apps.remove_app(app.id()), Err(Error::AppNotFound(_))));
    }
}
