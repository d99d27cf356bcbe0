//! Catalog entities
//!
//! # Modules
//!
//! - `component` - Component entity and kind
//! - `preview` - Preview entity and factory capability
//! - `category` - Category entity and the synthesized "Uncategorized" name
//! - `catalog` - Immutable catalog snapshot and its builder
//! - `catalog_info` - Wire (JSON) form of a snapshot

mod catalog;
mod catalog_info;
mod category;
mod component;
mod preview;

pub use catalog::{CatalogBuilder, CatalogConflict, CatalogSnapshot};
pub use catalog_info::{CatalogInfo, CategoryInfo, ComponentInfo, PreviewInfo};
pub use category::{Category, UNCATEGORIZED};
pub use component::{Component, ComponentKind};
pub use preview::{
    preview_factory, FnPreviewFactory, Preview, PreviewFactory, PreviewFactoryRef,
    PreviewInstance, PreviewOrigin,
};
