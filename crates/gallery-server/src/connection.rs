//! AppConnection - one accepted socket and its RPC stubs
//!
//! A connection starts in `Connecting` and only becomes part of an App once
//! the peer's `registerApp` call has been accepted. State changes are
//! published through a `watch` channel so the listener can wait for
//! registration without polling.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use gallery_core::{
    AppId, AppIdentity, CatalogInfo, CatalogSnapshot, ConnectionId, ConnectionInfo,
    ConnectionState, Error, Result,
};
use gallery_rpc::{methods, ComponentParams, PreviewList, PreviewParams, PreviewSnapshot, RpcPeer};
use std::sync::OnceLock;
use tokio::sync::watch;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
struct Registration {
    identity: AppIdentity,
    app_id: AppId,
    registered_at: i64,
}

/// One live transport channel to one app process
pub struct AppConnection {
    id: ConnectionId,
    peer_addr: Option<String>,
    connected_at: i64,
    peer: OnceLock<RpcPeer>,
    registration: OnceLock<Registration>,
    state: watch::Sender<ConnectionState>,
}

impl AppConnection {
    pub fn new(id: ConnectionId, peer_addr: Option<String>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Connecting);
        Self {
            id,
            peer_addr,
            connected_at: Utc::now().timestamp_micros(),
            peer: OnceLock::new(),
            registration: OnceLock::new(),
            state,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> Option<&str> {
        self.peer_addr.as_deref()
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_registered(&self) -> bool {
        self.state() == ConnectionState::Registered
    }

    pub fn app_id(&self) -> Option<&AppId> {
        self.registration.get().map(|r| &r.app_id)
    }

    pub fn identity(&self) -> Option<&AppIdentity> {
        self.registration.get().map(|r| &r.identity)
    }

    pub fn platform_name(&self) -> Option<&str> {
        self.identity().map(|i| i.platform_name.as_str())
    }

    pub fn info(&self) -> ConnectionInfo {
        let registration = self.registration.get();
        ConnectionInfo {
            id: self.id,
            peer_addr: self.peer_addr.clone(),
            state: self.state(),
            app_id: registration.map(|r| r.app_id.clone()),
            platform_name: registration.map(|r| r.identity.platform_name.clone()),
            connected_at: self.connected_at,
            registered_at: registration.map(|r| r.registered_at),
        }
    }

    /// Attach the outbound side of the channel (first call wins)
    pub(crate) fn bind(&self, peer: RpcPeer) {
        let _ = self.peer.set(peer);
    }

    fn peer(&self) -> Result<&RpcPeer> {
        let peer = self
            .peer
            .get()
            .ok_or_else(|| Error::ConnectionClosed(format!("{} has no channel", self.id)))?;
        if self.state() == ConnectionState::Closed || peer.is_closed() {
            return Err(Error::ConnectionClosed(self.id.to_string()));
        }
        Ok(peer)
    }

    fn transition(&self, next: ConnectionState) -> bool {
        self.state.send_if_modified(|state| {
            if state.can_transition_to(next) {
                *state = next;
                true
            } else {
                false
            }
        })
    }

    /// `Connecting -> Registered`; a second registration is a protocol violation
    pub(crate) fn mark_registered(&self, identity: AppIdentity, app_id: AppId) -> Result<()> {
        // Check and transition in one step so a concurrent close wins cleanly
        if !self.transition(ConnectionState::Registered) {
            return Err(Error::ProtocolViolation(format!(
                "{} is {}, registerApp is only accepted once",
                self.id,
                self.state()
            )));
        }
        self.registration
            .set(Registration {
                identity,
                app_id,
                registered_at: Utc::now().timestamp_micros(),
            })
            .map_err(|_| Error::ProtocolViolation(format!("{} already registered", self.id)))
    }

    /// Returns false if the connection was already closed
    pub(crate) fn mark_closed(&self) -> bool {
        self.transition(ConnectionState::Closed)
    }

    /// Wait until the connection leaves `Connecting`; true if it registered
    pub async fn wait_registered(&self) -> bool {
        let mut state = self.state.subscribe();
        let registered = match state.wait_for(|s| *s != ConnectionState::Connecting).await {
            Ok(state) => *state == ConnectionState::Registered,
            Err(_) => false,
        };
        registered
    }

    /// Close the underlying channel
    pub async fn close(&self) {
        if let Some(peer) = self.peer.get() {
            peer.close().await;
        }
    }

    // ------------------------------------------------------------------
    // Remote calls (tool -> app)
    // ------------------------------------------------------------------

    #[instrument(skip(self), fields(connection_id = %self.id))]
    pub async fn navigate_to_preview(
        &self,
        component_name: &str,
        preview_name: &str,
    ) -> Result<()> {
        let params = PreviewParams::new(component_name, preview_name);
        self.peer()?
            .call::<_, ()>(methods::NAVIGATE_TO_PREVIEW, &params)
            .await?;
        debug!("Navigated to preview");
        Ok(())
    }

    #[instrument(skip(self), fields(connection_id = %self.id))]
    pub async fn get_previews_for_component(&self, component_name: &str) -> Result<Vec<String>> {
        let params = ComponentParams {
            component_name: component_name.to_string(),
        };
        let list: PreviewList = self
            .peer()?
            .call(methods::GET_PREVIEWS_FOR_COMPONENT, &params)
            .await?;
        Ok(list.preview_names)
    }

    /// Pull the app's current catalog (browse-only on this side)
    #[instrument(skip(self), fields(connection_id = %self.id))]
    pub async fn get_catalog(&self) -> Result<CatalogSnapshot> {
        let info: CatalogInfo = self.peer()?.call(methods::GET_CATALOG, &()).await?;
        let snapshot = CatalogSnapshot::from_info(&info);
        debug!(
            components = snapshot.len(),
            previews = snapshot.preview_count(),
            "Received catalog"
        );
        Ok(snapshot)
    }

    /// Rendered image bytes of a preview
    #[instrument(skip(self), fields(connection_id = %self.id))]
    pub async fn get_preview_snapshot(
        &self,
        component_name: &str,
        preview_name: &str,
    ) -> Result<Vec<u8>> {
        let params = PreviewParams::new(component_name, preview_name);
        let snapshot: PreviewSnapshot = self
            .peer()?
            .call(methods::GET_PREVIEW_SNAPSHOT, &params)
            .await?;
        STANDARD
            .decode(snapshot.image_base64.as_bytes())
            .map_err(|e| Error::ProtocolViolation(format!("invalid snapshot encoding: {}", e)))
    }
}

impl std::fmt::Debug for AppConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConnection")
            .field("id", &self.id)
            .field("peer_addr", &self.peer_addr)
            .field("state", &self.state())
            .field("app_id", &self.app_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> AppIdentity {
        AppIdentity::new("C:\\app\\app.csproj", "Windows")
    }

    #[test]
    fn test_new_connection_is_connecting() {
        let conn = AppConnection::new(ConnectionId(1), Some("127.0.0.1:5000".into()));
        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert!(conn.app_id().is_none());

        let info = conn.info();
        assert_eq!(info.id, ConnectionId(1));
        assert_eq!(info.peer_addr.as_deref(), Some("127.0.0.1:5000"));
        assert!(info.registered_at.is_none());
    }

    #[test]
    fn test_register_once() {
        let conn = AppConnection::new(ConnectionId(1), None);
        let identity = identity();
        conn.mark_registered(identity.clone(), identity.app_id()).unwrap();

        assert!(conn.is_registered());
        assert_eq!(conn.platform_name(), Some("Windows"));
        assert_eq!(conn.info().app_id, Some(identity.app_id()));

        let err = conn.mark_registered(identity.clone(), identity.app_id()).unwrap_err();
        assert!(matches!(err, Error::ProtocolViolation(_)));
    }

    #[test]
    fn test_closed_cannot_register() {
        let conn = AppConnection::new(ConnectionId(1), None);
        assert!(conn.mark_closed());
        assert!(!conn.mark_closed());

        let identity = identity();
        assert!(conn.mark_registered(identity.clone(), identity.app_id()).is_err());
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_calls_without_channel_fail() {
        let conn = AppConnection::new(ConnectionId(4), None);
        let err = conn.navigate_to_preview("A", "B").await.unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed(_)));
    }

    #[tokio::test]
    async fn test_wait_registered_resolves_true_on_register() {
        let conn = std::sync::Arc::new(AppConnection::new(ConnectionId(3), None));
        let waiter = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.wait_registered().await })
        };
        let identity = identity();
        conn.mark_registered(identity.clone(), identity.app_id()).unwrap();
        assert!(waiter.await.unwrap());
        assert!(conn.wait_registered().await);
    }

    #[tokio::test]
    async fn test_wait_registered_resolves_false_on_close() {
        let conn = std::sync::Arc::new(AppConnection::new(ConnectionId(2), None));
        let waiter = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.wait_registered().await })
        };
        conn.mark_closed();
        assert!(!waiter.await.unwrap());
    }
}
