//! Requests the tool answers (app -> tool surface)

use crate::apps::AppsManager;
use crate::connection::AppConnection;
use async_trait::async_trait;
use gallery_core::{AppIdentity, Error, Result};
use gallery_rpc::{
    decode_params, encode_result, methods, RegisterAppParams, RegisterAppResult, RequestHandler,
    RpcPeer,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Serves `registerApp` and `notifyCatalogChanged` for one connection
pub struct ToolRequestHandler {
    connection: Arc<AppConnection>,
    apps: Arc<AppsManager>,
}

impl ToolRequestHandler {
    pub fn new(connection: Arc<AppConnection>, apps: Arc<AppsManager>) -> Self {
        Self { connection, apps }
    }

    fn register(&self, params: RegisterAppParams) -> Result<RegisterAppResult> {
        let identity = AppIdentity::new(params.project_path, params.platform_name);
        let app = self.apps.register(Arc::clone(&self.connection), identity)?;

        self.spawn_catalog_pull("registration");
        Ok(RegisterAppResult {
            app_id: app.id().clone(),
            connection_id: self.connection.id(),
        })
    }

    fn catalog_changed(&self) -> Result<()> {
        if !self.connection.is_registered() {
            return Err(Error::ProtocolViolation(format!(
                "{} sent {} before {}",
                self.connection.id(),
                methods::NOTIFY_CATALOG_CHANGED,
                methods::REGISTER_APP
            )));
        }
        self.spawn_catalog_pull("change notification");
        Ok(())
    }

    /// Pull the catalog over this connection in the background
    ///
    /// The request that triggered the pull is answered first; failures are
    /// logged and the App keeps its previous catalog.
    fn spawn_catalog_pull(&self, trigger: &'static str) {
        let connection = Arc::clone(&self.connection);
        let apps = Arc::clone(&self.apps);

        tokio::spawn(async move {
            let Some(app) = connection.app_id().and_then(|id| apps.app(id)) else {
                debug!(connection_id = %connection.id(), "App gone before catalog pull");
                return;
            };
            match app.refresh_catalog(&connection).await {
                Ok(version) => debug!(
                    connection_id = %connection.id(),
                    version,
                    trigger,
                    "Catalog pulled"
                ),
                Err(e) => warn!(
                    connection_id = %connection.id(),
                    app_id = %app.id(),
                    trigger,
                    error = %e,
                    "Catalog pull failed"
                ),
            }
        });
    }
}

#[async_trait]
impl RequestHandler for ToolRequestHandler {
    async fn handle_request(
        &self,
        peer: RpcPeer,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value> {
        self.connection.bind(peer);

        match method {
            methods::REGISTER_APP => {
                let params: RegisterAppParams = decode_params(method, params)?;
                info!(
                    connection_id = %self.connection.id(),
                    project_path = %params.project_path,
                    platform = %params.platform_name,
                    "Registration received"
                );
                encode_result(&self.register(params)?)
            }
            methods::NOTIFY_CATALOG_CHANGED => {
                self.catalog_changed()?;
                Ok(Value::Null)
            }
            other => Err(Error::MethodNotFound(other.to_string())),
        }
    }
}
