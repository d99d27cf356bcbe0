//! Catalog snapshot and its builder
//!
//! A snapshot is built once, then shared read-only. The builder is the only
//! place components and categories are assembled, and it enforces the
//! catalog invariants:
//! - component keys are unique
//! - preview keys are unique within their component
//! - a component belongs to at most one category (first declaration wins)

use super::{Category, Component, Preview};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Rejected builder operation
///
/// The scanner turns these into warnings; they never abort a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogConflict {
    DuplicateComponent(String),
    DuplicatePreview { component: String, preview: String },
    UnknownComponent(String),
    AlreadyCategorized { component: String, category: String },
}

impl fmt::Display for CatalogConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateComponent(name) => {
                write!(f, "component '{}' is already registered", name)
            }
            Self::DuplicatePreview { component, preview } => {
                write!(f, "preview '{}' is already registered on '{}'", preview, component)
            }
            Self::UnknownComponent(name) => write!(f, "component '{}' is not registered", name),
            Self::AlreadyCategorized {
                component,
                category,
            } => write!(f, "component '{}' already belongs to category '{}'", component, category),
        }
    }
}

/// Immutable component/preview/category graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    components: BTreeMap<String, Component>,
    categories: BTreeMap<String, Category>,
}

impl CatalogSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    /// Components in key order
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.get(name)
    }

    /// Declared categories in name order
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.categories.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn preview_count(&self) -> usize {
        self.components.values().map(|c| c.previews().len()).sum()
    }

    /// Resolve a (component, preview) pair
    ///
    /// Fails with `ComponentNotFound` before looking at the preview key.
    pub fn resolve(
        &self,
        component_name: &str,
        preview_name: &str,
    ) -> Result<(&Component, &Preview)> {
        let component = self
            .component(component_name)
            .ok_or_else(|| Error::component_not_found(component_name))?;
        let preview = component
            .preview(preview_name)
            .ok_or_else(|| Error::preview_not_found(component_name, preview_name))?;
        Ok((component, preview))
    }

    /// Ordered preview keys of a component
    pub fn preview_names(&self, component_name: &str) -> Result<Vec<String>> {
        self.component(component_name)
            .map(Component::preview_names)
            .ok_or_else(|| Error::component_not_found(component_name))
    }

    /// All `(component key, preview key)` pairs
    pub fn preview_pairs(&self) -> Vec<(String, String)> {
        self.components
            .values()
            .flat_map(|c| {
                c.previews()
                    .iter()
                    .map(move |p| (c.name().to_string(), p.name().to_string()))
            })
            .collect()
    }
}

/// Assembles a `CatalogSnapshot`
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    components: BTreeMap<String, Component>,
    categories: BTreeMap<String, Category>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, component_name: &str) -> bool {
        self.components.contains_key(component_name)
    }

    pub fn component(&self, component_name: &str) -> Option<&Component> {
        self.components.get(component_name)
    }

    pub fn component_names(&self) -> Vec<String> {
        self.components.keys().cloned().collect()
    }

    /// Register a component; the first registration of a key wins
    pub fn add_component(
        &mut self,
        component: Component,
    ) -> std::result::Result<(), CatalogConflict> {
        if self.components.contains_key(component.name()) {
            return Err(CatalogConflict::DuplicateComponent(component.name().to_string()));
        }
        self.components.insert(component.name().to_string(), component);
        Ok(())
    }

    /// Attach a preview to its owning component (`preview.component_name()`)
    pub fn add_preview(&mut self, preview: Preview) -> std::result::Result<(), CatalogConflict> {
        let owner = preview.component_name().to_string();
        let component = self
            .components
            .get(&owner)
            .ok_or_else(|| CatalogConflict::UnknownComponent(owner.clone()))?;

        if component.has_preview(preview.name()) {
            return Err(CatalogConflict::DuplicatePreview {
                component: owner,
                preview: preview.name().to_string(),
            });
        }

        let updated = component.with_added_preview(preview);
        self.components.insert(owner, updated);
        Ok(())
    }

    /// Declare a category (idempotent)
    pub fn add_category(&mut self, name: &str) {
        self.categories
            .entry(name.to_string())
            .or_insert_with(|| Category::new(name));
    }

    /// Add a component to a category
    pub fn add_to_category(
        &mut self,
        category: &str,
        component_name: &str,
    ) -> std::result::Result<(), CatalogConflict> {
        let component = self
            .components
            .get(component_name)
            .ok_or_else(|| CatalogConflict::UnknownComponent(component_name.to_string()))?;

        if let Some(existing) = component.category() {
            return Err(CatalogConflict::AlreadyCategorized {
                component: component_name.to_string(),
                category: existing.to_string(),
            });
        }

        let updated = component.clone().with_category(category);
        self.components.insert(component_name.to_string(), updated);
        self.add_category(category);
        if let Some(entry) = self.categories.get_mut(category) {
            entry.component_names.push(component_name.to_string());
        }
        Ok(())
    }

    pub fn build(self) -> CatalogSnapshot {
        CatalogSnapshot {
            components: self.components,
            categories: self.categories,
        }
    }
}


#[cfg(test)]
mod proptest_tests {
    use super::*;
    use crate::entities::PreviewOrigin;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn key() -> impl Strategy<Value = String> {
        "[A-C]\\.[a-c]{1,2}"
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        /// Whatever order components and previews arrive in, pairs stay unique
        /// and every preview sits on the component it names
        #[test]
        fn proptest_builder_keeps_pairs_unique(
            components in prop::collection::vec(key(), 0..8),
            previews in prop::collection::vec((key(), key()), 0..24)
        ) {
            let mut builder = CatalogBuilder::new();
            for name in &components {
                let _ = builder.add_component(Component::new(name.clone()));
            }
            for (owner, preview) in &previews {
                let preview = Preview::new(preview.clone(), owner.clone(), PreviewOrigin::Explicit);
                let _ = builder.add_preview(preview);
            }
            let snapshot = builder.build();

            let pairs = snapshot.preview_pairs();
            let unique: HashSet<_> = pairs.iter().cloned().collect();
            prop_assert_eq!(unique.len(), pairs.len());

            for component in snapshot.components() {
                for preview in component.previews() {
                    prop_assert_eq!(preview.component_name(), component.name());
                }
            }
        }
    }
}
