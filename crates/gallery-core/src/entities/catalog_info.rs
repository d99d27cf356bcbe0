//! Wire representation of a catalog snapshot
//!
//! Factories do not cross process boundaries, so a snapshot rebuilt from a
//! `CatalogInfo` is browse-only: its previews carry no factory.

use super::{CatalogBuilder, CatalogSnapshot, Component, ComponentKind, Preview, PreviewOrigin};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogInfo {
    pub components: Vec<ComponentInfo>,
    #[serde(default)]
    pub categories: Vec<CategoryInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentInfo {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub kind: ComponentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub previews: Vec<PreviewInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewInfo {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub auto_generated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInfo {
    pub name: String,
    #[serde(default)]
    pub component_names: Vec<String>,
}

impl CatalogSnapshot {
    /// Serializable view of this snapshot
    pub fn to_info(&self) -> CatalogInfo {
        let components = self
            .components()
            .map(|c| ComponentInfo {
                name: c.name().to_string(),
                display_name: c.display_name().to_string(),
                kind: c.kind(),
                category: c.category().map(str::to_string),
                previews: c
                    .previews()
                    .iter()
                    .map(|p| PreviewInfo {
                        name: p.name().to_string(),
                        display_name: p.display_name().to_string(),
                        auto_generated: p.is_auto_generated(),
                    })
                    .collect(),
            })
            .collect();

        let categories = self
            .categories()
            .map(|c| CategoryInfo {
                name: c.name.clone(),
                component_names: c.component_names.clone(),
            })
            .collect();

        CatalogInfo {
            components,
            categories,
        }
    }

    /// Rebuild a browse-only snapshot from its wire form
    ///
    /// Inconsistent input (duplicate keys, categories naming unknown
    /// components) is dropped with a warning rather than rejected.
    pub fn from_info(info: &CatalogInfo) -> CatalogSnapshot {
        let mut builder = CatalogBuilder::new();

        for component in &info.components {
            let entry = Component::new(&component.name)
                .with_display_name(&component.display_name)
                .with_kind(component.kind);
            if let Err(conflict) = builder.add_component(entry) {
                warn!(%conflict, "Dropping component from received catalog");
                continue;
            }
            for preview in &component.previews {
                let origin = if preview.auto_generated {
                    PreviewOrigin::AutoGenerated
                } else {
                    PreviewOrigin::Remote
                };
                let entry = Preview::new(&preview.name, &component.name, origin)
                    .with_display_name(&preview.display_name);
                if let Err(conflict) = builder.add_preview(entry) {
                    warn!(%conflict, "Dropping preview from received catalog");
                }
            }
        }

        for category in &info.categories {
            builder.add_category(&category.name);
            for member in &category.component_names {
                if let Err(conflict) = builder.add_to_category(&category.name, member) {
                    warn!(
                        %conflict,
                        category = %category.name,
                        "Dropping category member from received catalog"
                    );
                }
            }
        }

        // Components may carry a category that no category entry lists
        for component in &info.components {
            if let Some(category) = &component.category {
                let already = builder
                    .component(&component.name)
                    .and_then(|c| c.category())
                    .is_some();
                if !already {
                    let _ = builder.add_to_category(category, &component.name);
                }
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::preview_factory;

    fn sample() -> CatalogSnapshot {
        let mut builder = CatalogBuilder::new();
        builder
            .add_component(Component::new("MyApp.LoginPage").with_kind(ComponentKind::Page))
            .unwrap();
        builder
            .add_component(Component::new("MyApp.Avatar").with_kind(ComponentKind::Control))
            .unwrap();
        builder
            .add_preview(
                Preview::new(
                    "MyApp.LoginPagePreviews.Default",
                    "MyApp.LoginPage",
                    PreviewOrigin::ReturnType,
                )
                .with_factory(preview_factory(|| Box::new(()))),
            )
            .unwrap();
        builder
            .add_preview(Preview::new(
                "MyApp.Avatar",
                "MyApp.Avatar",
                PreviewOrigin::AutoGenerated,
            ))
            .unwrap();
        builder.add_to_category("Auth", "MyApp.LoginPage").unwrap();
        builder.build()
    }

    #[test]
    fn test_wire_round_trip_preserves_pairs() {
        let snapshot = sample();
        let json = serde_json::to_string(&snapshot.to_info()).unwrap();
        let info: CatalogInfo = serde_json::from_str(&json).unwrap();
        let remote = CatalogSnapshot::from_info(&info);

        assert_eq!(remote.preview_pairs(), snapshot.preview_pairs());
        assert_eq!(remote.component("MyApp.LoginPage").unwrap().category(), Some("Auth"));
        assert_eq!(remote.component("MyApp.Avatar").unwrap().kind(), ComponentKind::Control);
        assert!(remote.component("MyApp.Avatar").unwrap().previews()[0].is_auto_generated());
    }

    #[test]
    fn test_remote_previews_have_no_factory() {
        let remote = CatalogSnapshot::from_info(&sample().to_info());
        let (_, preview) = remote.resolve("MyApp.LoginPage", "Default").unwrap();
        assert!(!preview.has_factory());
    }

    #[test]
    fn test_camel_case_wire_fields() {
        let json = serde_json::to_value(sample().to_info()).unwrap();
        assert_eq!(json["components"][0]["displayName"], "Avatar");
        assert_eq!(json["categories"][0]["componentNames"][0], "MyApp.LoginPage");
    }

    #[test]
    fn test_from_info_drops_duplicates() {
        let info: CatalogInfo = serde_json::from_value(serde_json::json!({
            "components": [
                {"name": "A", "displayName": "A", "previews": [
                    {"name": "A.One", "displayName": "One"},
                    {"name": "A.One", "displayName": "Again"}
                ]},
                {"name": "A", "displayName": "Other"}
            ],
            "categories": [{"name": "Misc", "componentNames": ["A", "Missing"]}]
        }))
        .unwrap();

        let snapshot = CatalogSnapshot::from_info(&info);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.preview_count(), 1);
        assert_eq!(snapshot.component("A").unwrap().kind(), ComponentKind::Unknown);
        assert_eq!(snapshot.category("Misc").unwrap().component_names, vec!["A"]);
    }
}
