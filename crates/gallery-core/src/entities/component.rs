//! Component entity

use super::preview::unqualified_name;
use super::Preview;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of UI a component represents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Page,
    Control,
    #[default]
    Unknown,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Control => "control",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered unit of UI eligible to have previews
///
/// Immutable once it sits in a snapshot; "mutations" return a modified copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    name: String,
    display_name: String,
    kind: ComponentKind,
    category: Option<String>,
    previews: Vec<Preview>,
    auto_generate_preview: bool,
}

impl Component {
    /// Create a component keyed by its fully-qualified type name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: unqualified_name(&name).to_string(),
            name,
            kind: ComponentKind::Unknown,
            category: None,
            previews: Vec::new(),
            auto_generate_preview: true,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_kind(mut self, kind: ComponentKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_auto_generate_preview(mut self, enabled: bool) -> Self {
        self.auto_generate_preview = enabled;
        self
    }

    /// Copy of this component with `preview` appended
    pub fn with_added_preview(&self, preview: Preview) -> Component {
        let mut copy = self.clone();
        copy.previews.push(preview);
        copy
    }

    /// Fully-qualified type name (unique key)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Previews in declaration order
    pub fn previews(&self) -> &[Preview] {
        &self.previews
    }

    pub fn auto_generate_preview(&self) -> bool {
        self.auto_generate_preview
    }

    pub fn has_preview(&self, key: &str) -> bool {
        self.previews.iter().any(|p| p.name() == key)
    }

    /// Find a preview by key, falling back to an unambiguous short name
    pub fn preview(&self, key: &str) -> Option<&Preview> {
        if let Some(exact) = self.previews.iter().find(|p| p.name() == key) {
            return Some(exact);
        }
        let mut candidates = self.previews.iter().filter(|p| p.short_name() == key);
        match (candidates.next(), candidates.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    pub fn preview_names(&self) -> Vec<String> {
        self.previews.iter().map(|p| p.name().to_string()).collect()
    }
}
