//! App identity value object
//!
//! The same logical app may run on several devices at once; all of those
//! connections report the same project path. This module turns that path into
//! a stable key:
//! - Same project path (modulo separators/whitespace) → same `AppId`
//! - Different project path → different `AppId`

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// Stable identifier of a logical app
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppId(pub String);

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity reported by an app during registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    /// Project path exactly as reported by the app
    pub project_path: String,
    /// Platform the app instance runs on (e.g., "Windows", "Android")
    pub platform_name: String,
}

impl AppIdentity {
    pub fn new(project_path: impl Into<String>, platform_name: impl Into<String>) -> Self {
        Self {
            project_path: project_path.into(),
            platform_name: platform_name.into(),
        }
    }

    /// Normalized project path used for grouping
    ///
    /// Trims whitespace, converts `\` to `/` and strips trailing separators.
    /// Case is preserved.
    pub fn normalized_project_path(&self) -> String {
        normalize_project_path(&self.project_path)
    }

    /// Deterministic app id
    ///
    /// Formula: SHA256(normalized_project_path)[0..16], hex encoded
    ///
    /// # Examples
    ///
    /// ```
    /// use gallery_core::AppIdentity;
    ///
    /// let windows = AppIdentity::new("C:\\app\\app.csproj", "Windows");
    /// let android = AppIdentity::new("C:/app/app.csproj", "Android");
    /// assert_eq!(windows.app_id(), android.app_id()); // Platform is not part of identity
    /// ```
    pub fn app_id(&self) -> AppId {
        let hash = Sha256::digest(self.normalized_project_path().as_bytes());
        AppId(hex::encode(&hash[0..16]))
    }

    /// Display name derived from the project file stem (`app.csproj` → `app`)
    pub fn project_name(&self) -> String {
        let normalized = self.normalized_project_path();
        Path::new(&normalized)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or(normalized)
    }

    /// Validate identity components
    pub fn validate(&self) -> Result<(), String> {
        if self.normalized_project_path().is_empty() {
            return Err("Project path cannot be empty".to_string());
        }
        if self.platform_name.trim().is_empty() {
            return Err("Platform name cannot be empty".to_string());
        }
        Ok(())
    }
}

fn normalize_project_path(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");
    let trimmed = unified.trim_end_matches('/');
    if trimmed.is_empty() && !unified.is_empty() {
        // Root path ("/") stays meaningful
        return "/".to_string();
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_id_deterministic() {
        let a = AppIdentity::new("/src/app/app.csproj", "iOS");
        let b = AppIdentity::new("/src/app/app.csproj", "iOS");
        assert_eq!(a.app_id(), b.app_id());
    }

    #[test]
    fn test_platform_does_not_change_app_id() {
        let a = AppIdentity::new("/src/app/app.csproj", "iOS");
        let b = AppIdentity::new("/src/app/app.csproj", "Android");
        assert_eq!(a.app_id(), b.app_id());
    }

    #[test]
    fn test_separators_normalized() {
        let a = AppIdentity::new("C:\\app\\app.csproj", "Windows");
        let b = AppIdentity::new("  C:/app/app.csproj/ ", "Windows");
        assert_eq!(a.app_id(), b.app_id());
        assert_eq!(a.normalized_project_path(), "C:/app/app.csproj");
    }

    #[test]
    fn test_different_path_different_id() {
        let a = AppIdentity::new("/src/one/one.csproj", "Windows");
        let b = AppIdentity::new("/src/two/two.csproj", "Windows");
        assert_ne!(a.app_id(), b.app_id());
    }

    #[test]
    fn test_app_id_is_32_hex_chars() {
        let id = AppIdentity::new("/a.csproj", "Windows").app_id();
        assert_eq!(id.0.len(), 32);
        assert!(id.0.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_project_name_from_stem() {
        let identity = AppIdentity::new("C:\\app\\app.csproj", "Windows");
        assert_eq!(identity.project_name(), "app");
    }

    #[test]
    fn test_validate() {
        assert!(AppIdentity::new("/a.csproj", "Windows").validate().is_ok());
        assert!(AppIdentity::new("   ", "Windows").validate().is_err());
        assert!(AppIdentity::new("/a.csproj", "").validate().is_err());
    }
}
