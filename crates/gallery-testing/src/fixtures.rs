//! Synthetic type graphs and sample data
//!
//! ```rust,ignore
//! use gallery_testing::fixtures;
//!
//! let catalog = fixtures::sample_catalog();
//! assert!(catalog.current().component(fixtures::LOGIN_PAGE).is_some());
//! ```

use gallery_catalog::{
    AssemblyAttribute, AssemblyInfo, CatalogManager, ComponentAttribute, InMemoryIntrospector,
    MemberInfo, PreviewAttribute, TypeAttribute, TypeInfo, TypeRef, TypeScanner,
};
use gallery_core::{
    preview_factory, AppIdentity, CatalogBuilder, CatalogSnapshot, Component, FnPreviewFactory,
    Preview, PreviewFactoryRef, PreviewInstance, PreviewOrigin,
};
use std::sync::Arc;

pub const SAMPLE_PROJECT_PATH: &str = "C:\\app\\app.csproj";
pub const SAMPLE_PLATFORM: &str = "Windows";

pub const LOGIN_PAGE: &str = "MyApp.LoginPage";
pub const SETTINGS_PAGE: &str = "MyApp.SettingsPage";
pub const PRODUCT_CARD: &str = "MyApp.Controls.ProductCard";
pub const AVATAR: &str = "Shared.Avatar";

/// Preview keys of `LOGIN_PAGE` in the sample assembly
pub const LOGIN_DEFAULT: &str = "MyApp.LoginPreviews.Default";
pub const LOGIN_ERROR: &str = "MyApp.LoginPreviews.Error";

/// Factory producing a labelled placeholder instance
pub fn labelled_factory(label: &'static str) -> PreviewFactoryRef {
    preview_factory(move || -> PreviewInstance { Box::new(label) })
}

/// Identity used by the sample app
pub fn sample_identity() -> AppIdentity {
    AppIdentity::new(SAMPLE_PROJECT_PATH, SAMPLE_PLATFORM)
}

/// Library assembly referenced by the sample app
pub fn shared_assembly() -> AssemblyInfo {
    AssemblyInfo::new("Shared")
        .with_type(
            TypeInfo::new(AVATAR)
                .extends("System.Windows.Controls.UserControl")
                .with_default_constructor(labelled_factory("avatar")),
        )
        .with_attribute(AssemblyAttribute::Category {
            name: "Identity".into(),
            component_types: vec![AVATAR.into()],
        })
}

/// A small WPF app: two pages, one control, member and type-level previews
pub fn sample_app_assembly() -> AssemblyInfo {
    AssemblyInfo::new("MyApp")
        .references(["Shared", "PresentationFramework"])
        .with_type(
            TypeInfo::new(LOGIN_PAGE)
                .extends("System.Windows.Controls.Page")
                .with_attribute(TypeAttribute::Component(
                    ComponentAttribute::new().display_name("Login").category("Auth"),
                ))
                .with_default_constructor(labelled_factory("login")),
        )
        .with_type(
            TypeInfo::new("MyApp.LoginPreviews")
                .with_member(
                    MemberInfo::new("Default")
                        .returns(TypeRef::new(LOGIN_PAGE))
                        .with_attribute(PreviewAttribute::new())
                        .with_factory(labelled_factory("login-default")),
                )
                .with_member(
                    MemberInfo::new("Error")
                        .returns(TypeRef::new(LOGIN_PAGE))
                        .with_attribute(PreviewAttribute::new().display_name("Error state"))
                        .with_factory(labelled_factory("login-error")),
                ),
        )
        .with_type(
            TypeInfo::new(SETTINGS_PAGE)
                .extends("System.Windows.Window")
                .with_default_constructor(labelled_factory("settings")),
        )
        .with_type(
            TypeInfo::new(PRODUCT_CARD)
                .extends("System.Windows.Controls.UserControl")
                .with_attribute(TypeAttribute::Preview(
                    PreviewAttribute::new().display_name("Card"),
                ))
                .with_default_constructor(labelled_factory("card")),
        )
        .with_attribute(AssemblyAttribute::Category {
            name: "Widgets".into(),
            component_types: vec![PRODUCT_CARD.into()],
        })
}

/// Introspector over the sample app and its library
pub fn sample_introspector() -> Arc<InMemoryIntrospector> {
    Arc::new(
        InMemoryIntrospector::new()
            .with_assembly(sample_app_assembly())
            .with_assembly(shared_assembly()),
    )
}

pub fn sample_scanner() -> TypeScanner {
    TypeScanner::new(sample_introspector())
}

/// Catalog manager scanned from the sample app
pub fn sample_catalog() -> Arc<CatalogManager> {
    Arc::new(CatalogManager::from_scanner(sample_scanner()))
}

/// Catalog with a single component whose only preview takes parameters
pub fn parameterized_catalog() -> Arc<CatalogManager> {
    // A fresh builder cannot conflict
    let mut builder = CatalogBuilder::new();
    let _ = builder.add_component(Component::new(LOGIN_PAGE));
    let _ = builder.add_preview(
        Preview::new("MyApp.LoginPreviews.WithUser", LOGIN_PAGE, PreviewOrigin::Explicit)
            .with_factory(Arc::new(
                FnPreviewFactory::new(|| -> PreviewInstance { Box::new("unreachable") })
                    .with_parameter_count(1),
            )),
    );
    Arc::new(CatalogManager::with_snapshot(builder.build()))
}

/// Snapshot with the given component keys and no previews
pub fn components_only(names: &[&str]) -> CatalogSnapshot {
    let mut builder = CatalogBuilder::new();
    for name in names {
        // Duplicate names collapse into one component
        let _ = builder.add_component(Component::new(*name));
    }
    builder.build()
}
