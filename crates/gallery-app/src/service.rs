//! Platform collaborator boundary
//!
//! The client never renders anything itself: it resolves and instantiates
//! the preview, then hands the instance to the host's `AppService`.

use async_trait::async_trait;
use gallery_core::{Component, Error, Preview, PreviewInstance, Result};
use std::sync::Arc;

#[async_trait]
pub trait AppService: Send + Sync {
    /// Show an instantiated preview
    async fn navigate_to_preview(
        &self,
        component: &Component,
        preview: &Preview,
        instance: PreviewInstance,
    ) -> Result<()>;

    /// Encoded image of a rendered preview
    ///
    /// Hosts without a capture capability keep the default.
    async fn get_preview_snapshot(
        &self,
        _component: &Component,
        _preview: &Preview,
    ) -> Result<Vec<u8>> {
        Err(Error::SnapshotNotSupported)
    }
}

pub type AppServiceRef = Arc<dyn AppService>;
