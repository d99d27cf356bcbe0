//! Catalog manager
//!
//! Owns the current snapshot and publishes replacements through a `watch`
//! channel: each publish swaps one `Arc`, so a reader sees either the old
//! snapshot or the new one, never a mix. Derived views (sorted, categorized)
//! live next to the snapshot they were computed from and are built lazily on
//! first use, so a publish implicitly invalidates them.

use crate::scanner::{ScanOutcome, TypeScanner};
use gallery_core::{CatalogSnapshot, Component, Error, Result, UNCATEGORIZED};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;
use tracing::{debug, info};

/// One category bucket of the categorized view
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBucket {
    pub name: String,
    /// Members in display order
    pub components: Vec<Component>,
}

/// A published snapshot together with its lazily derived views
#[derive(Debug)]
pub struct PublishedCatalog {
    version: u64,
    snapshot: Arc<CatalogSnapshot>,
    sorted: OnceLock<Arc<Vec<Component>>>,
    categorized: OnceLock<Arc<Vec<CategoryBucket>>>,
}

impl PublishedCatalog {
    fn new(version: u64, snapshot: Arc<CatalogSnapshot>) -> Self {
        Self {
            version,
            snapshot,
            sorted: OnceLock::new(),
            categorized: OnceLock::new(),
        }
    }

    /// Monotonic publish counter (0 = initial snapshot)
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn snapshot(&self) -> &Arc<CatalogSnapshot> {
        &self.snapshot
    }

    pub fn sorted_components(&self) -> Arc<Vec<Component>> {
        Arc::clone(self.sorted.get_or_init(|| {
            let mut components: Vec<Component> = self.snapshot.components().cloned().collect();
            components.sort_by(compare_components);
            Arc::new(components)
        }))
    }

    pub fn categorized_components(&self) -> Arc<Vec<CategoryBucket>> {
        Arc::clone(self.categorized.get_or_init(|| {
            let mut buckets: BTreeMap<String, Vec<Component>> = BTreeMap::new();
            for component in self.sorted_components().iter() {
                let category = component.category().unwrap_or(UNCATEGORIZED);
                buckets
                    .entry(category.to_string())
                    .or_default()
                    .push(component.clone());
            }

            let mut categorized: Vec<CategoryBucket> = buckets
                .into_iter()
                .map(|(name, components)| CategoryBucket { name, components })
                .collect();
            categorized.sort_by(|a, b| compare_display_names(&a.name, &b.name));
            Arc::new(categorized)
        }))
    }
}

/// Case-insensitive comparison, then ordinal to keep the order total
pub fn compare_display_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare_components(a: &Component, b: &Component) -> Ordering {
    compare_display_names(a.display_name(), b.display_name()).then_with(|| a.name().cmp(b.name()))
}

/// Owns and publishes the current catalog snapshot
#[derive(Debug)]
pub struct CatalogManager {
    scanner: Option<TypeScanner>,
    sender: watch::Sender<Arc<PublishedCatalog>>,
}

impl CatalogManager {
    /// Manager fed by explicit `publish` calls (e.g. catalogs received over the wire)
    pub fn new() -> Self {
        Self::with_snapshot(CatalogSnapshot::empty())
    }

    pub fn with_snapshot(snapshot: CatalogSnapshot) -> Self {
        let (sender, _) = watch::channel(Arc::new(PublishedCatalog::new(0, Arc::new(snapshot))));
        Self {
            scanner: None,
            sender,
        }
    }

    /// Manager that scans on construction and on every `rescan`
    pub fn from_scanner(scanner: TypeScanner) -> Self {
        let outcome = scanner.scan();
        let (sender, _) = watch::channel(Arc::new(PublishedCatalog::new(0, outcome.snapshot)));
        Self {
            scanner: Some(scanner),
            sender,
        }
    }

    /// Latest published snapshot
    pub fn current(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(self.sender.borrow().snapshot())
    }

    /// Latest published snapshot together with its derived views
    pub fn published(&self) -> Arc<PublishedCatalog> {
        Arc::clone(&self.sender.borrow())
    }

    pub fn version(&self) -> u64 {
        self.sender.borrow().version()
    }

    /// Components sorted by display name
    pub fn sorted_components(&self) -> Arc<Vec<Component>> {
        self.published().sorted_components()
    }

    /// Non-empty category buckets (including "Uncategorized"), sorted by name
    pub fn categorized_components(&self) -> Arc<Vec<CategoryBucket>> {
        self.published().categorized_components()
    }

    /// Replace the current snapshot; returns the new version
    pub fn publish(&self, snapshot: impl Into<Arc<CatalogSnapshot>>) -> u64 {
        let snapshot = snapshot.into();
        let mut version = 0;
        self.sender.send_modify(|current| {
            version = current.version() + 1;
            *current = Arc::new(PublishedCatalog::new(version, Arc::clone(&snapshot)));
        });
        debug!(
            version,
            components = snapshot.len(),
            previews = snapshot.preview_count(),
            "Published catalog snapshot"
        );
        version
    }

    /// Run the scanner and publish its result
    ///
    /// The scan runs without holding any lock; only the final swap is
    /// synchronized.
    pub fn rescan(&self) -> Result<ScanOutcome> {
        let scanner = self
            .scanner
            .as_ref()
            .ok_or_else(|| Error::Internal("catalog manager has no scanner".to_string()))?;

        let outcome = scanner.scan();
        let version = self.publish(Arc::clone(&outcome.snapshot));
        info!(version, warnings = outcome.warnings.len(), "Catalog rescanned");
        Ok(outcome)
    }

    /// Receiver notified on every publish
    pub fn subscribe(&self) -> watch::Receiver<Arc<PublishedCatalog>> {
        self.sender.subscribe()
    }
}

impl Default for CatalogManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspection::{AssemblyInfo, InMemoryIntrospector, TypeInfo};
    use gallery_core::{CatalogBuilder, ComponentKind};

    fn snapshot_of(components: &[(&str, &str, Option<&str>)]) -> CatalogSnapshot {
        let mut builder = CatalogBuilder::new();
        for (name, display, category) in components {
            builder
                .add_component(Component::new(*name).with_display_name(*display))
                .unwrap();
            if let Some(category) = category {
                builder.add_to_category(category, name).unwrap();
            }
        }
        builder.build()
    }

    #[test]
    fn test_sorted_case_insensitive() {
        let manager = CatalogManager::with_snapshot(snapshot_of(&[
            ("N.b", "beta", None),
            ("N.A", "Alpha", None),
            ("N.C", "Charlie", None),
            ("N.a2", "alpha", None),
        ]));

        let sorted: Vec<String> = manager
            .sorted_components()
            .iter()
            .map(|c| c.display_name().to_string())
            .collect();
        assert_eq!(sorted, vec!["Alpha", "alpha", "beta", "Charlie"]);
    }

    #[test]
    fn test_uncategorized_sorted_like_any_category() {
        let manager = CatalogManager::with_snapshot(snapshot_of(&[
            ("N.Login", "Login", Some("Auth")),
            ("N.Card", "Card", None),
            ("N.Zoom", "Zoom", Some("Viewers")),
        ]));

        let names: Vec<String> = manager
            .categorized_components()
            .iter()
            .map(|b| b.name.clone())
            .collect();
        assert_eq!(names, vec!["Auth", UNCATEGORIZED, "Viewers"]);
    }

    #[test]
    fn test_categorized_is_partition_of_sorted() {
        let manager = CatalogManager::with_snapshot(snapshot_of(&[
            ("N.Login", "Login", Some("Auth")),
            ("N.Logout", "Logout", Some("Auth")),
            ("N.Card", "Card", None),
        ]));

        let mut from_buckets: Vec<String> = manager
            .categorized_components()
            .iter()
            .flat_map(|b| b.components.iter().map(|c| c.name().to_string()))
            .collect();
        let mut sorted: Vec<String> = manager
            .sorted_components()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        from_buckets.sort();
        sorted.sort();
        assert_eq!(from_buckets, sorted);
    }

    #[test]
    fn test_publish_invalidates_views() {
        let manager = CatalogManager::with_snapshot(snapshot_of(&[("N.A", "A", None)]));
        assert_eq!(manager.sorted_components().len(), 1);

        let version = manager.publish(snapshot_of(&[("N.A", "A", None), ("N.B", "B", None)]));
        assert_eq!(version, 1);
        assert_eq!(manager.sorted_components().len(), 2);
        assert_eq!(manager.categorized_components()[0].components.len(), 2);
    }

    #[test]
    fn test_old_readers_keep_their_snapshot() {
        let manager = CatalogManager::with_snapshot(snapshot_of(&[("N.A", "A", None)]));
        let held = manager.current();

        manager.publish(CatalogSnapshot::empty());

        assert_eq!(held.len(), 1);
        assert!(manager.current().is_empty());
    }

    #[test]
    fn test_rescan_without_scanner_fails() {
        let manager = CatalogManager::new();
        assert!(matches!(manager.rescan(), Err(Error::Internal(_))));
    }

    #[test]
    fn test_rescan_picks_up_changes() {
        let introspector = Arc::new(InMemoryIntrospector::new().with_assembly(
            AssemblyInfo::new("App")
                .with_type(TypeInfo::new("App.Main").extends("System.Windows.Window")),
        ));
        let manager = CatalogManager::from_scanner(TypeScanner::new(introspector.clone()));
        assert_eq!(manager.current().len(), 1);

        introspector.register_assembly(
            AssemblyInfo::new("App")
                .with_type(TypeInfo::new("App.Main").extends("System.Windows.Window"))
                .with_type(
                    TypeInfo::new("App.Card").extends("System.Windows.Controls.UserControl"),
                ),
        );
        manager.rescan().unwrap();

        assert_eq!(manager.version(), 1);
        assert_eq!(
            manager.current().component("App.Card").unwrap().kind(),
            ComponentKind::Control
        );
    }

    #[tokio::test]
    async fn test_subscribers_notified_on_publish() {
        let manager = CatalogManager::new();
        let mut receiver = manager.subscribe();

        manager.publish(snapshot_of(&[("N.A", "A", None)]));

        receiver.changed().await.unwrap();
        assert_eq!(receiver.borrow_and_update().version(), 1);
    }
}
