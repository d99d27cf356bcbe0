//! Type scanner settings

use crate::constants::DEFAULT_EXCLUDED_ASSEMBLY_PREFIXES;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Assembly name prefixes never scanned (framework assemblies)
    #[serde(default = "default_excluded_assembly_prefixes")]
    pub excluded_assembly_prefixes: Vec<String>,
}

fn default_excluded_assembly_prefixes() -> Vec<String> {
    DEFAULT_EXCLUDED_ASSEMBLY_PREFIXES
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            excluded_assembly_prefixes: default_excluded_assembly_prefixes(),
        }
    }
}

impl ScannerConfig {
    pub fn is_excluded(&self, assembly_name: &str) -> bool {
        self.excluded_assembly_prefixes
            .iter()
            .any(|prefix| assembly_name.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framework_assemblies_excluded() {
        let config = ScannerConfig::default();
        assert!(config.is_excluded("System.Runtime"));
        assert!(config.is_excluded("Microsoft.Maui.Controls"));
        assert!(config.is_excluded("mscorlib"));
        assert!(!config.is_excluded("MyApp"));
        assert!(!config.is_excluded("SystemTools"));
    }
}
