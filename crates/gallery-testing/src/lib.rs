//! Test utilities for the preview gallery
//!
//! # Mocks
//!
//! - [`RecordingAppService`] - app-side navigator that records instead of rendering
//!
//! # Fixtures
//!
//! - [`fixtures::sample_app_assembly`] - synthetic WPF app type graph
//! - [`fixtures::sample_catalog`] - catalog manager scanned from it
//! - [`fixtures::parameterized_catalog`] - a preview that can never be instantiated
//!
//! # Harness
//!
//! - [`ToolHarness`] - a running tool on a loopback port plus client helpers
//! - [`wait_until`] - bounded polling for eventually-true conditions
//!
//! ```rust,ignore
//! let mut tool = ToolHarness::start().await?;
//! let service = Arc::new(RecordingAppService::new());
//! let client = tool
//!     .connect_app(fixtures::sample_identity(), fixtures::sample_catalog(), service)
//!     .await?;
//! tool.wait_for_event(AppEventKind::CatalogUpdated).await;
//! ```

pub mod fixtures;
mod harness;
mod mocks;
pub mod proptest_config;

pub use harness::{wait_until, ToolHarness, WAIT_TIMEOUT};
pub use mocks::{Navigation, RecordingAppService};
