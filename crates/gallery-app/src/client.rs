//! ToolingClient - the app's connection to the tool
//!
//! Lifecycle:
//! 1. parse the configured endpoint (`host:port`)
//! 2. dial within the connect timeout
//! 3. call `registerApp` within the register timeout; on failure the socket
//!    is closed and `connect` returns the error
//! 4. serve tool requests and send `notifyCatalogChanged` after every catalog
//!    publish until the channel closes

use crate::endpoint::ToolEndpoint;
use crate::handler::AppRequestHandler;
use crate::service::AppServiceRef;
use gallery_catalog::{CatalogManager, PublishedCatalog};
use gallery_config::{AppClientConfig, RpcConfig};
use gallery_core::{AppId, AppIdentity, ConnectionId, Error, Result};
use gallery_rpc::{methods, RegisterAppParams, RegisterAppResult, RpcChannel, RpcPeer};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

pub struct ToolingClient {
    endpoint: ToolEndpoint,
    identity: AppIdentity,
    channel: RpcChannel,
    registration: RegisterAppResult,
    catalog_watcher: JoinHandle<()>,
}

impl ToolingClient {
    /// Dial the tool, register and start serving
    #[instrument(skip_all, fields(project_path = %identity.project_path))]
    pub async fn connect(
        config: &AppClientConfig,
        identity: AppIdentity,
        catalog: Arc<CatalogManager>,
        service: AppServiceRef,
    ) -> Result<Self> {
        let raw = config
            .tool_endpoint
            .as_deref()
            .ok_or_else(|| Error::InvalidConfig("no tool endpoint configured".to_string()))?;
        let endpoint = ToolEndpoint::parse(raw)?;
        identity
            .validate()
            .map_err(|reason| Error::InvalidConfig(format!("invalid app identity: {}", reason)))?;

        let stream = dial(&endpoint, config).await?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "Could not set TCP_NODELAY");
        }

        let rpc = RpcConfig {
            request_timeout_ms: config.request_timeout_ms,
            connect_timeout_ms: config.connect_timeout_ms,
            ..RpcConfig::default()
        };
        let handler = Arc::new(AppRequestHandler::new(Arc::clone(&catalog), service));
        let channel = RpcChannel::from_tcp(format!("tool@{}", endpoint), stream, rpc, handler);

        // Subscribe before registering so a publish racing the handshake
        // still produces a notification
        let mut catalog_rx = catalog.subscribe();
        catalog_rx.mark_unchanged();

        let registration = match register(&channel, &identity, config).await {
            Ok(registration) => registration,
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Registration failed, closing connection");
                channel.close().await;
                return Err(e);
            }
        };
        info!(
            endpoint = %endpoint,
            app_id = %registration.app_id,
            connection_id = %registration.connection_id,
            "Registered with tool"
        );

        let catalog_watcher = tokio::spawn(watch_catalog(channel.peer(), catalog_rx));

        Ok(Self {
            endpoint,
            identity,
            channel,
            registration,
            catalog_watcher,
        })
    }

    pub fn endpoint(&self) -> &ToolEndpoint {
        &self.endpoint
    }

    pub fn identity(&self) -> &AppIdentity {
        &self.identity
    }

    /// App id assigned by the tool
    pub fn app_id(&self) -> &AppId {
        &self.registration.app_id
    }

    /// Connection id assigned by the tool
    pub fn connection_id(&self) -> ConnectionId {
        self.registration.connection_id
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_alive()
    }

    /// Tell the tool to re-pull the catalog
    pub async fn notify_catalog_changed(&self) -> Result<()> {
        self.channel
            .call::<_, ()>(methods::NOTIFY_CATALOG_CHANGED, &())
            .await?;
        Ok(())
    }

    /// Resolves once the connection to the tool is gone
    pub async fn closed(&self) {
        self.channel.closed().await;
    }

    pub async fn close(&self) {
        self.catalog_watcher.abort();
        self.channel.close().await;
        info!(endpoint = %self.endpoint, "Disconnected from tool");
    }
}

impl Drop for ToolingClient {
    fn drop(&mut self) {
        self.catalog_watcher.abort();
    }
}

impl std::fmt::Debug for ToolingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolingClient")
            .field("endpoint", &self.endpoint.to_string())
            .field("app_id", &self.registration.app_id)
            .field("connection_id", &self.registration.connection_id)
            .field("connected", &self.is_connected())
            .finish()
    }
}

async fn dial(endpoint: &ToolEndpoint, config: &AppClientConfig) -> Result<TcpStream> {
    let timeout = config.connect_timeout();
    let connect = TcpStream::connect((endpoint.host(), endpoint.port()));
    match tokio::time::timeout(timeout, connect).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(Error::Transport(format!("failed to connect to {}: {}", endpoint, e))),
        Err(_) => Err(Error::Transport(format!(
            "timed out connecting to {} after {}ms",
            endpoint,
            timeout.as_millis()
        ))),
    }
}

async fn register(
    channel: &RpcChannel,
    identity: &AppIdentity,
    config: &AppClientConfig,
) -> Result<RegisterAppResult> {
    let params = RegisterAppParams {
        project_path: identity.project_path.clone(),
        platform_name: identity.platform_name.clone(),
    };
    let call = channel.call::<_, RegisterAppResult>(methods::REGISTER_APP, &params);
    match tokio::time::timeout(config.register_timeout(), call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(Error::RegistrationTimeout(config.register_timeout_ms)),
    }
}

async fn watch_catalog(
    peer: RpcPeer,
    mut catalog_rx: watch::Receiver<Arc<PublishedCatalog>>,
) {
    loop {
        tokio::select! {
            changed = catalog_rx.changed() => {
                if changed.is_err() {
                    debug!("Catalog manager dropped, stopping change notifications");
                    return;
                }
                let version = catalog_rx.borrow_and_update().version();
                match peer.call::<_, ()>(methods::NOTIFY_CATALOG_CHANGED, &()).await {
                    Ok(()) => debug!(version, "Notified tool of catalog change"),
                    Err(e) => warn!(version, error = %e, "Catalog change notification failed"),
                }
            }
            _ = peer.closed() => return,
        }
    }
}
