//! Gallery Core - Component/preview metadata and domain types
//!
//! This crate contains the data model shared by the app side (which scans its
//! own types) and the tool side (which browses catalogs reported over the
//! wire). It has no I/O and no async runtime dependency.
//!
//! # Architecture
//!
//! - `entities` - Component, Preview, Category and the immutable CatalogSnapshot
//! - `error` - Domain error taxonomy with machine-readable codes
//! - `app_identity` - Project path normalization and stable App ids
//! - `connection` - Connection ids, states and public connection info
//! - `app_event` - Observable App/Connection lifecycle events
//!
//! # Related Crates
//!
//! - Scanning and catalog management: `gallery-catalog`
//! - Wire protocol: `gallery-rpc`

pub mod app_event;
pub mod app_identity;
pub mod connection;
pub mod entities;
pub mod error;

pub use app_event::{AppEvent, AppEventKind};
pub use app_identity::{AppId, AppIdentity};
pub use connection::{ConnectionId, ConnectionInfo, ConnectionState};
pub use entities::{
    preview_factory, CatalogBuilder, CatalogConflict, CatalogInfo, CatalogSnapshot, Category,
    CategoryInfo, Component, ComponentInfo, ComponentKind, FnPreviewFactory, Preview,
    PreviewFactory, PreviewFactoryRef, PreviewInfo, PreviewInstance, PreviewOrigin,
    UNCATEGORIZED,
};
pub use error::{Error, ErrorCategory, ErrorCode, NotFoundError, Result};
