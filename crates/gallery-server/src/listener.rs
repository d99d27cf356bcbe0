//! ConnectionListener - TCP accept loop for app connections
//!
//! Each accepted socket gets its own task that:
//! 1. wraps the socket in an `RpcChannel` served by `ToolRequestHandler`
//! 2. waits for `registerApp` (bounded by the registration timeout)
//! 3. waits for the channel to close
//! 4. detaches the connection from its App
//!
//! `connection_count()` counts accepted sockets that are still open,
//! registered or not.

use crate::apps::AppsManager;
use crate::connection::AppConnection;
use crate::handler::ToolRequestHandler;
use dashmap::DashMap;
use gallery_config::{ListenerConfig, RpcConfig};
use gallery_core::{ConnectionId, ConnectionInfo, Error, Result};
use gallery_rpc::RpcChannel;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Pause after a failed accept (e.g. file descriptor exhaustion)
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

type ConnectionMap = Arc<DashMap<ConnectionId, Arc<AppConnection>>>;

struct Running {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

/// Everything a connection task needs, cloned per socket
#[derive(Clone)]
struct ConnectionContext {
    apps: Arc<AppsManager>,
    connections: ConnectionMap,
    rpc: RpcConfig,
    registration_timeout: Duration,
}

pub struct ConnectionListener {
    config: ListenerConfig,
    rpc: RpcConfig,
    apps: Arc<AppsManager>,
    connections: ConnectionMap,
    next_id: Arc<AtomicU64>,
    running: Mutex<Option<Running>>,
}

impl ConnectionListener {
    pub fn new(config: ListenerConfig, rpc: RpcConfig, apps: Arc<AppsManager>) -> Self {
        Self {
            config,
            rpc,
            apps,
            connections: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
            running: Mutex::new(None),
        }
    }

    fn lock_running(&self) -> MutexGuard<'_, Option<Running>> {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Bind and start accepting; returns the bound port
    ///
    /// Calling it again while running returns the existing port.
    pub async fn start_listening(&self) -> Result<u16> {
        if let Some(port) = self.port() {
            return Ok(port);
        }

        let address = self.config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| Error::Transport(format!("failed to bind {}: {}", address, e)))?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let context = ConnectionContext {
            apps: Arc::clone(&self.apps),
            connections: Arc::clone(&self.connections),
            rpc: self.rpc.clone(),
            registration_timeout: self.config.registration_timeout(),
        };
        let accept_task = tokio::spawn(accept_loop(
            listener,
            shutdown_rx,
            context,
            Arc::clone(&self.next_id),
        ));

        let mut running = self.lock_running();
        if let Some(existing) = running.as_ref() {
            // Lost a start race; keep the first listener
            accept_task.abort();
            return Ok(existing.local_addr.port());
        }
        *running = Some(Running {
            local_addr,
            shutdown_tx,
            accept_task,
        });
        info!(address = %local_addr, "Listening for app connections");
        Ok(local_addr.port())
    }

    /// Bound port, if listening
    pub fn port(&self) -> Option<u16> {
        self.local_addr().map(|addr| addr.port())
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock_running().as_ref().map(|r| r.local_addr)
    }

    pub fn is_listening(&self) -> bool {
        self.lock_running().is_some()
    }

    /// Accepted sockets that are still open
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn connections(&self) -> Vec<ConnectionInfo> {
        let mut infos: Vec<ConnectionInfo> = self
            .connections
            .iter()
            .map(|entry| entry.value().info())
            .collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    pub fn connection(&self, id: ConnectionId) -> Option<Arc<AppConnection>> {
        self.connections.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Close the listener and every open connection
    pub async fn stop_listening(&self) {
        let Some(running) = self.lock_running().take() else {
            return;
        };
        let _ = running.shutdown_tx.send(true);
        if tokio::time::timeout(Duration::from_secs(1), running.accept_task)
            .await
            .is_err()
        {
            warn!("Accept loop did not stop in time");
        }

        // Collect first: no DashMap guard may be held across an await
        let open: Vec<Arc<AppConnection>> = self
            .connections
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for connection in &open {
            connection.close().await;
        }
        info!(closed_connections = open.len(), "Stopped listening");
    }
}

impl Drop for ConnectionListener {
    fn drop(&mut self) {
        let running = self
            .running
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(running) = running {
            running.accept_task.abort();
        }
    }
}

impl std::fmt::Debug for ConnectionListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionListener")
            .field("address", &self.local_addr())
            .field("connections", &self.connection_count())
            .finish()
    }
}

async fn accept_loop(
    listener: TcpListener,
    mut shutdown_rx: watch::Receiver<bool>,
    context: ConnectionContext,
    next_id: Arc<AtomicU64>,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown_rx.changed() => {
                debug!("Accept loop received shutdown signal");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    let id = ConnectionId(next_id.fetch_add(1, Ordering::Relaxed));
                    tokio::spawn(serve_connection(stream, peer_addr, id, context.clone()));
                }
                Err(e) => {
                    error!(error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    id: ConnectionId,
    context: ConnectionContext,
) {
    let connection = Arc::new(AppConnection::new(id, Some(peer_addr.to_string())));
    context.connections.insert(id, Arc::clone(&connection));
    info!(connection_id = %id, peer = %peer_addr, "Connection accepted");

    if let Err(e) = stream.set_nodelay(true) {
        debug!(connection_id = %id, error = %e, "Could not set TCP_NODELAY");
    }

    let handler = Arc::new(ToolRequestHandler::new(
        Arc::clone(&connection),
        Arc::clone(&context.apps),
    ));
    let channel = RpcChannel::from_tcp(id.to_string(), stream, context.rpc.clone(), handler);
    connection.bind(channel.peer());

    tokio::select! {
        registered = connection.wait_registered() => {
            if !registered {
                debug!(connection_id = %id, "Connection closed before registering");
            }
        }
        _ = channel.closed() => {}
        _ = tokio::time::sleep(context.registration_timeout) => {
            let timeout_ms = context.registration_timeout.as_millis() as u64;
            warn!(
                connection_id = %id,
                error = %Error::RegistrationTimeout(timeout_ms),
                "Dropping unregistered connection"
            );
            channel.close().await;
        }
    }

    channel.closed().await;
    connection.mark_closed();
    context.apps.connection_closed(&connection);
    context.connections.remove(&id);
    info!(
        connection_id = %id,
        reason = channel.close_reason().as_deref().unwrap_or("unknown"),
        "Connection closed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_config::AppsConfig;
    use tokio::io::AsyncReadExt;

    fn listener(registration_timeout_ms: u64) -> ConnectionListener {
        let config = ListenerConfig {
            registration_timeout_ms,
            ..ListenerConfig::default()
        };
        let apps = Arc::new(AppsManager::new(&AppsConfig::default()));
        ConnectionListener::new(config, RpcConfig::default(), apps)
    }

    async fn wait_for_count(listener: &ConnectionListener, expected: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while listener.connection_count() != expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "connection count stuck at {}, expected {}",
                listener.connection_count(),
                expected
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_connection_count_lifecycle() {
        let listener = listener(10_000);
        let port = listener.start_listening().await.unwrap();
        assert_ne!(port, 0);
        assert_eq!(listener.connection_count(), 0);

        let socket = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        wait_for_count(&listener, 1).await;

        drop(socket);
        wait_for_count(&listener, 0).await;

        listener.stop_listening().await;
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let listener = listener(10_000);
        let first = listener.start_listening().await.unwrap();
        let second = listener.start_listening().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(listener.port(), Some(first));
        listener.stop_listening().await;
        assert!(!listener.is_listening());
        assert_eq!(listener.port(), None);
    }

    #[tokio::test]
    async fn test_unregistered_connection_dropped_after_timeout() {
        let listener = listener(50);
        let port = listener.start_listening().await.unwrap();

        let mut socket = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        wait_for_count(&listener, 1).await;

        // Server closes its side once the window passes
        let mut buf = [0u8; 16];
        let read = tokio::time::timeout(Duration::from_secs(2), socket.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read, 0);
        wait_for_count(&listener, 0).await;

        listener.stop_listening().await;
    }

    #[tokio::test]
    async fn test_stop_listening_closes_connections() {
        let listener = listener(10_000);
        let port = listener.start_listening().await.unwrap();

        let mut socket = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        wait_for_count(&listener, 1).await;

        listener.stop_listening().await;

        let mut buf = [0u8; 16];
        let read = tokio::time::timeout(Duration::from_secs(2), socket.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read, 0);
        wait_for_count(&listener, 0).await;
        assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let listener = listener(10_000);
        let port = listener.start_listening().await.unwrap();

        let _a = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let _b = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        wait_for_count(&listener, 2).await;

        let ids: Vec<ConnectionId> = listener.connections().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![ConnectionId(1), ConnectionId(2)]);

        listener.stop_listening().await;
    }
}
