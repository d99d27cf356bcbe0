//! Category entity

use serde::{Deserialize, Serialize};

/// Name of the bucket synthesized at query time for components without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A named group of components, used for display only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Member component keys in declaration order
    pub component_names: Vec<String>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            component_names: Vec::new(),
        }
    }

    pub fn contains(&self, component_name: &str) -> bool {
        self.component_names.iter().any(|c| c == component_name)
    }
}
