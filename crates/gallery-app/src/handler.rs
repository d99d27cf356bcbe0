//! Requests the app answers (tool -> app surface)

use crate::service::AppServiceRef;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use gallery_catalog::CatalogManager;
use gallery_core::{Error, Result};
use gallery_rpc::{
    decode_params, encode_result, methods, ComponentParams, GetCatalogResult, PreviewList,
    PreviewParams, PreviewSnapshot, RequestHandler, RpcPeer,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Serves the app's catalog and forwards navigation to the `AppService`
pub struct AppRequestHandler {
    catalog: Arc<CatalogManager>,
    service: AppServiceRef,
}

impl AppRequestHandler {
    pub fn new(catalog: Arc<CatalogManager>, service: AppServiceRef) -> Self {
        Self { catalog, service }
    }

    /// Resolve against the current snapshot, instantiate, then navigate
    ///
    /// Nothing reaches the service unless both keys resolve and the factory
    /// takes no parameters.
    async fn navigate(&self, params: PreviewParams) -> Result<()> {
        let snapshot = self.catalog.current();
        let (component, preview) = snapshot.resolve(&params.component_name, &params.preview_name)?;
        let instance = preview.instantiate()?;

        self.service
            .navigate_to_preview(component, preview, instance)
            .await?;
        info!(
            component = %component.name(),
            preview = %preview.name(),
            "Navigated to preview"
        );
        Ok(())
    }

    fn previews_for(&self, params: ComponentParams) -> Result<PreviewList> {
        let preview_names = self.catalog.current().preview_names(&params.component_name)?;
        Ok(PreviewList { preview_names })
    }

    fn catalog_info(&self) -> GetCatalogResult {
        self.catalog.current().to_info()
    }

    async fn snapshot(&self, params: PreviewParams) -> Result<PreviewSnapshot> {
        let snapshot = self.catalog.current();
        let (component, preview) = snapshot.resolve(&params.component_name, &params.preview_name)?;
        let bytes = self.service.get_preview_snapshot(component, preview).await?;
        debug!(preview = %preview.name(), bytes = bytes.len(), "Captured preview snapshot");
        Ok(PreviewSnapshot {
            image_base64: STANDARD.encode(bytes),
        })
    }
}

#[async_trait]
impl RequestHandler for AppRequestHandler {
    async fn handle_request(
        &self,
        _peer: RpcPeer,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value> {
        match method {
            methods::NAVIGATE_TO_PREVIEW => {
                self.navigate(decode_params(method, params)?).await?;
                Ok(Value::Null)
            }
            methods::GET_PREVIEWS_FOR_COMPONENT => {
                encode_result(&self.previews_for(decode_params(method, params)?)?)
            }
            methods::GET_CATALOG => encode_result(&self.catalog_info()),
            methods::GET_PREVIEW_SNAPSHOT => {
                encode_result(&self.snapshot(decode_params(method, params)?).await?)
            }
            other => Err(Error::MethodNotFound(other.to_string())),
        }
    }
}
