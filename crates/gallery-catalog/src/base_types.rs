//! Platform base-type registry
//!
//! Maps well-known UI base types to the component kind their subclasses get
//! when they carry no explicit component annotation.

use gallery_core::ComponentKind;
use std::collections::HashMap;

/// Compiled-in `(platform, type name, kind)` entries
const DEFAULT_BASE_TYPES: &[(&str, &str, ComponentKind)] = &[
    // WPF
    ("WPF", "System.Windows.Window", ComponentKind::Page),
    ("WPF", "System.Windows.Controls.Page", ComponentKind::Page),
    ("WPF", "System.Windows.Controls.UserControl", ComponentKind::Control),
    // .NET MAUI
    ("MAUI", "Microsoft.Maui.Controls.ContentPage", ComponentKind::Page),
    ("MAUI", "Microsoft.Maui.Controls.ContentView", ComponentKind::Control),
    // WinUI
    ("WinUI", "Microsoft.UI.Xaml.Controls.Page", ComponentKind::Page),
    ("WinUI", "Microsoft.UI.Xaml.Controls.UserControl", ComponentKind::Control),
    // Avalonia
    ("Avalonia", "Avalonia.Controls.Window", ComponentKind::Page),
    ("Avalonia", "Avalonia.Controls.UserControl", ComponentKind::Control),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseTypeEntry {
    pub platform: String,
    pub kind: ComponentKind,
}

#[derive(Debug, Clone, Default)]
pub struct BaseTypeRegistry {
    entries: HashMap<String, BaseTypeEntry>,
}

impl BaseTypeRegistry {
    /// Empty registry (no platform defaults)
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the WPF, MAUI, WinUI and Avalonia base types
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (platform, type_name, kind) in DEFAULT_BASE_TYPES {
            registry.register(platform, type_name, *kind);
        }
        registry
    }

    /// Register a base type; an existing entry for the same name is kept
    pub fn register(&mut self, platform: &str, type_name: &str, kind: ComponentKind) -> bool {
        if self.entries.contains_key(type_name) {
            return false;
        }
        self.entries.insert(
            type_name.to_string(),
            BaseTypeEntry {
                platform: platform.to_string(),
                kind,
            },
        );
        true
    }

    pub fn register_page(&mut self, platform: &str, type_name: &str) -> bool {
        self.register(platform, type_name, ComponentKind::Page)
    }

    pub fn register_control(&mut self, platform: &str, type_name: &str) -> bool {
        self.register(platform, type_name, ComponentKind::Control)
    }

    pub fn lookup(&self, type_name: &str) -> Option<&BaseTypeEntry> {
        self.entries.get(type_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
