//! Mock `AppService` implementations

use async_trait::async_trait;
use gallery_app::AppService;
use gallery_core::{Component, Error, Preview, PreviewInstance, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One navigation the service received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub component: String,
    pub preview: String,
}

/// Records every navigation instead of rendering
///
/// Snapshots are unsupported unless built with `with_snapshots`, in which
/// case the "image" is the preview key's bytes.
#[derive(Debug, Default)]
pub struct RecordingAppService {
    navigations: Mutex<Vec<Navigation>>,
    snapshots: bool,
    snapshot_count: AtomicUsize,
    fail_with: Option<Error>,
}

impl RecordingAppService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshots() -> Self {
        Self {
            snapshots: true,
            ..Self::default()
        }
    }

    /// Service whose navigations all fail with `error`
    pub fn failing(error: Error) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    pub fn navigations(&self) -> Vec<Navigation> {
        self.navigations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn navigation_count(&self) -> usize {
        self.navigations().len()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshot_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AppService for RecordingAppService {
    async fn navigate_to_preview(
        &self,
        component: &Component,
        preview: &Preview,
        _instance: PreviewInstance,
    ) -> Result<()> {
        if let Some(error) = &self.fail_with {
            return Err(error.clone());
        }
        self.navigations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Navigation {
                component: component.name().to_string(),
                preview: preview.name().to_string(),
            });
        Ok(())
    }

    async fn get_preview_snapshot(
        &self,
        _component: &Component,
        preview: &Preview,
    ) -> Result<Vec<u8>> {
        if !self.snapshots {
            return Err(Error::SnapshotNotSupported);
        }
        self.snapshot_count.fetch_add(1, Ordering::SeqCst);
        Ok(preview.name().as_bytes().to_vec())
    }
}
