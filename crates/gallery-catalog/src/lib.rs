//! Gallery Catalog - Type scanning and catalog management
//!
//! - `introspection` - Pluggable type-introspection provider and the plain
//!   data it yields (assemblies, types, members, annotations)
//! - `base_types` - Platform base types that imply a component kind
//! - `scanner` - Builds a `CatalogSnapshot` from candidate assemblies
//! - `manager` - Publishes snapshots and serves sorted/categorized views
//!
//! # Example
//!
//! ```rust,ignore
//! use gallery_catalog::{CatalogManager, InMemoryIntrospector, TypeScanner};
//!
//! let introspector = Arc::new(InMemoryIntrospector::new().with_assembly(app_assembly));
//! let catalog = CatalogManager::from_scanner(TypeScanner::new(introspector));
//! for bucket in catalog.categorized_components().iter() {
//!     println!("{}: {}", bucket.name, bucket.components.len());
//! }
//! ```

pub mod base_types;
pub mod introspection;
pub mod manager;
pub mod scanner;
mod warnings;

pub use base_types::{BaseTypeEntry, BaseTypeRegistry};
pub use introspection::{
    AssemblyAttribute, AssemblyInfo, ComponentAttribute, InMemoryIntrospector, MemberInfo,
    PreviewAttribute, TypeAttribute, TypeInfo, TypeIntrospector, TypeIntrospectorRef, TypeRef,
};
pub use manager::{compare_display_names, CatalogManager, CategoryBucket, PublishedCatalog};
pub use scanner::{topological_order, ExclusionFilter, ScanOutcome, TypeScanner};
pub use warnings::ScanWarning;

/// Shared reference to a catalog manager
pub type CatalogManagerRef = std::sync::Arc<CatalogManager>;
