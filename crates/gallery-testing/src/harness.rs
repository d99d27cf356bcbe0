//! Tool-side harness for end-to-end tests
//!
//! Starts a real `DevToolsContext` on an ephemeral loopback port and connects
//! real `ToolingClient`s to it.

use gallery_app::{AppServiceRef, ToolingClient};
use gallery_catalog::CatalogManager;
use gallery_config::{AppClientConfig, AppRemovalPolicy, Config};
use gallery_core::{AppEvent, AppEventKind, AppIdentity, Result};
use gallery_server::{AppsManager, ConnectionListener, DevToolsContext};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

/// How long helpers wait before giving up
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(3);

pub struct ToolHarness {
    context: DevToolsContext,
    port: u16,
    events: broadcast::Receiver<AppEvent>,
}

impl ToolHarness {
    /// Tool with default settings (apps are retained when idle)
    pub async fn start() -> Result<Self> {
        Self::start_with(Config::default()).await
    }

    pub async fn with_policy(policy: AppRemovalPolicy, grace_period_ms: u64) -> Result<Self> {
        let mut config = Config::default();
        config.apps.removal_policy = policy;
        config.apps.grace_period_ms = grace_period_ms;
        Self::start_with(config).await
    }

    pub async fn start_with(mut config: Config) -> Result<Self> {
        config.listener.host = "127.0.0.1".into();
        config.listener.port = 0;

        let context = DevToolsContext::new(&config);
        let events = context.apps.subscribe();
        let port = context.start().await?;
        Ok(Self {
            context,
            port,
            events,
        })
    }

    pub fn apps(&self) -> &Arc<AppsManager> {
        &self.context.apps
    }

    pub fn listener(&self) -> &Arc<ConnectionListener> {
        &self.context.listener
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Client settings pointing at this tool, with short timeouts
    pub fn client_config(&self) -> AppClientConfig {
        AppClientConfig {
            connect_timeout_ms: 1_000,
            request_timeout_ms: 2_000,
            register_timeout_ms: 2_000,
            ..AppClientConfig::new(format!("127.0.0.1:{}", self.port))
        }
    }

    pub async fn connect_app(
        &self,
        identity: AppIdentity,
        catalog: Arc<CatalogManager>,
        service: AppServiceRef,
    ) -> Result<ToolingClient> {
        ToolingClient::connect(&self.client_config(), identity, catalog, service).await
    }

    /// Next app event, or `None` after `WAIT_TIMEOUT`
    pub async fn next_event(&mut self) -> Option<AppEvent> {
        loop {
            match tokio::time::timeout(WAIT_TIMEOUT, self.events.recv()).await {
                Ok(Ok(event)) => return Some(event),
                Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
                Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => return None,
            }
        }
    }

    /// Skip events until one of `kind` arrives
    pub async fn wait_for_event(&mut self, kind: AppEventKind) -> Option<AppEvent> {
        let deadline = Instant::now() + WAIT_TIMEOUT;
        while Instant::now() < deadline {
            let event = self.next_event().await?;
            if event.kind == kind {
                return Some(event);
            }
        }
        None
    }

    pub async fn shutdown(&self) {
        self.context.shutdown().await;
    }
}

/// Poll `condition` every 10ms until it holds or `WAIT_TIMEOUT` passes
pub async fn wait_until<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + WAIT_TIMEOUT;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
