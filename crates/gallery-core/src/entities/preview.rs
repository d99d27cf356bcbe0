//! Preview entity and preview factories

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An instantiated preview (the UI object handed to the platform navigator)
pub type PreviewInstance = Box<dyn Any + Send>;

/// Thread-safe reference to a preview factory
pub type PreviewFactoryRef = Arc<dyn PreviewFactory>;

/// Capability to instantiate the previewed UI
pub trait PreviewFactory: Send + Sync {
    /// Number of parameters the underlying factory declares
    fn parameter_count(&self) -> usize {
        0
    }

    /// Create a new instance of the previewed UI
    fn create(&self) -> Result<PreviewInstance>;
}

/// Closure-backed preview factory
pub struct FnPreviewFactory<F> {
    parameter_count: usize,
    f: F,
}

impl<F> FnPreviewFactory<F>
where
    F: Fn() -> PreviewInstance + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            parameter_count: 0,
            f,
        }
    }

    /// Declare parameters on the factory (such factories are never invoked)
    pub fn with_parameter_count(mut self, count: usize) -> Self {
        self.parameter_count = count;
        self
    }
}

impl<F> PreviewFactory for FnPreviewFactory<F>
where
    F: Fn() -> PreviewInstance + Send + Sync,
{
    fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    fn create(&self) -> Result<PreviewInstance> {
        Ok((self.f)())
    }
}

/// Wrap a closure as a shareable preview factory
pub fn preview_factory<F>(f: F) -> PreviewFactoryRef
where
    F: Fn() -> PreviewInstance + Send + Sync + 'static,
{
    Arc::new(FnPreviewFactory::new(f))
}

/// How a preview's owning component was determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewOrigin {
    /// Annotation named the component
    Explicit,
    /// Inferred from the factory's return type
    ReturnType,
    /// Preview annotation on the component type itself
    DeclaringType,
    /// Synthesized for a component without explicit previews
    AutoGenerated,
    /// Received over the wire
    Remote,
}

/// A named, parameterless factory for an instance of UI
#[derive(Clone)]
pub struct Preview {
    name: String,
    display_name: String,
    component_name: String,
    origin: PreviewOrigin,
    factory: Option<PreviewFactoryRef>,
}

impl Preview {
    /// Create a preview keyed by `name` (fully-qualified member name)
    pub fn new(
        name: impl Into<String>,
        component_name: impl Into<String>,
        origin: PreviewOrigin,
    ) -> Self {
        let name = name.into();
        Self {
            display_name: unqualified_name(&name).to_string(),
            name,
            component_name: component_name.into(),
            origin,
            factory: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_factory(mut self, factory: PreviewFactoryRef) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Fully-qualified key, unique within the owning component
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member name without its declaring type (`MyApp.Previews.Default` → `Default`)
    pub fn short_name(&self) -> &str {
        unqualified_name(&self.name)
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Key of the owning component
    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    pub fn origin(&self) -> PreviewOrigin {
        self.origin
    }

    pub fn is_auto_generated(&self) -> bool {
        self.origin == PreviewOrigin::AutoGenerated
    }

    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }

    /// Instantiate the previewed UI
    ///
    /// Fails fast for factories declaring parameters; they are never called
    /// with placeholder arguments.
    pub fn instantiate(&self) -> Result<PreviewInstance> {
        let factory = self
            .factory
            .as_ref()
            .ok_or_else(|| Error::PreviewNotInstantiable(self.name.clone()))?;

        let count = factory.parameter_count();
        if count > 0 {
            return Err(Error::PreviewParametersNotSupported {
                preview: self.name.clone(),
                count,
            });
        }

        factory.create()
    }

    /// Whether `key` designates this preview (full key or unqualified name)
    pub fn matches(&self, key: &str) -> bool {
        self.name == key || self.short_name() == key
    }
}

impl PartialEq for Preview {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.display_name == other.display_name
            && self.component_name == other.component_name
            && self.origin == other.origin
            && self.factory.is_some() == other.factory.is_some()
    }
}

impl fmt::Debug for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preview")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("component_name", &self.component_name)
            .field("origin", &self.origin)
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}

/// Last segment of a dotted (or nested `+`) name
pub(crate) fn unqualified_name(name: &str) -> &str {
    name.rsplit(['.', '+']).next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_factory() -> PreviewFactoryRef {
        preview_factory(|| Box::new("label".to_string()))
    }

    #[test]
    fn test_display_name_defaults_to_member_name() {
        let preview = Preview::new(
            "MyApp.LoginPagePreviews.Default",
            "MyApp.LoginPage",
            PreviewOrigin::ReturnType,
        );
        assert_eq!(preview.display_name(), "Default");
        assert_eq!(preview.short_name(), "Default");
    }

    #[test]
    fn test_matches_full_and_short_name() {
        let preview = Preview::new(
            "MyApp.Previews.Default",
            "MyApp.LoginPage",
            PreviewOrigin::Explicit,
        );
        assert!(preview.matches("MyApp.Previews.Default"));
        assert!(preview.matches("Default"));
        assert!(!preview.matches("Previews.Default"));
    }

    #[test]
    fn test_instantiate_nullary_factory() {
        let preview =
            Preview::new("P.Default", "C", PreviewOrigin::Explicit).with_factory(label_factory());
        let instance = preview.instantiate().unwrap();
        assert_eq!(instance.downcast_ref::<String>().unwrap(), "label");
    }

    #[test]
    fn test_instantiate_parameterized_factory_fails_fast() {
        let factory: PreviewFactoryRef = Arc::new(
            FnPreviewFactory::new(|| -> PreviewInstance { panic!("must not be invoked") })
                .with_parameter_count(1),
        );
        let preview =
            Preview::new("P.WithUser", "C", PreviewOrigin::Explicit).with_factory(factory);

        match preview.instantiate() {
            Err(Error::PreviewParametersNotSupported { preview, count }) => {
                assert_eq!(preview, "P.WithUser");
                assert_eq!(count, 1);
            }
            Err(other) => panic!("Expected PreviewParametersNotSupported, got {:?}", other),
            Ok(_) => panic!("Expected PreviewParametersNotSupported, got an instance"),
        }
    }

    #[test]
    fn test_instantiate_without_factory() {
        let preview = Preview::new("P.Default", "C", PreviewOrigin::Remote);
        assert!(matches!(
            preview.instantiate(),
            Err(Error::PreviewNotInstantiable(_))
        ));
    }

    #[test]
    fn test_nested_type_unqualified_name() {
        assert_eq!(unqualified_name("MyApp.Outer+Inner"), "Inner");
        assert_eq!(unqualified_name("Plain"), "Plain");
    }
}
