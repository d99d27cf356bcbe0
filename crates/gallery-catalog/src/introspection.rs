//! Type-introspection provider
//!
//! The scanner never touches a runtime's reflection API directly. It asks a
//! `TypeIntrospector` for the candidate assemblies, each described as plain
//! data: declared types, their annotations, base-type names and the
//! factories able to instantiate them.

use gallery_core::{ComponentKind, PreviewFactoryRef};
use std::fmt;
use std::sync::{Arc, RwLock};

/// Source of candidate assemblies for a scan
pub trait TypeIntrospector: Send + Sync {
    /// The app's own assembly plus any explicitly registered additional ones
    fn candidate_assemblies(&self) -> Vec<Arc<AssemblyInfo>>;
}

pub type TypeIntrospectorRef = Arc<dyn TypeIntrospector>;

/// Reference to a (possibly generic) type, as seen in a signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub generic_args: Vec<TypeRef>,
}

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generic_args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            generic_args: args,
        }
    }

    /// `void` / `System.Void`
    pub fn is_void(&self) -> bool {
        matches!(self.name.as_str(), "void" | "System.Void")
    }

    /// Unqualified name with any generic arity suffix removed (`RoutePreview`1` → `RoutePreview`)
    pub fn simple_name(&self) -> &str {
        let unqualified = self.name.rsplit('.').next().unwrap_or(&self.name);
        unqualified.split('`').next().unwrap_or(unqualified)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.generic_args.is_empty() {
            let args: Vec<String> = self.generic_args.iter().map(|a| a.to_string()).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

/// "This type is a component" annotation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentAttribute {
    pub display_name: Option<String>,
    pub kind: Option<ComponentKind>,
    pub category: Option<String>,
    pub auto_generate_preview: Option<bool>,
}

impl ComponentAttribute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn kind(mut self, kind: ComponentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn auto_generate_preview(mut self, enabled: bool) -> Self {
        self.auto_generate_preview = Some(enabled);
        self
    }
}

/// "This is a preview" annotation, on a type or a member
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewAttribute {
    pub display_name: Option<String>,
    /// Explicit owning component (fully-qualified type name)
    pub component: Option<String>,
}

impl PreviewAttribute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn for_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeAttribute {
    Component(ComponentAttribute),
    Preview(PreviewAttribute),
}

/// Assembly-level declarations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyAttribute {
    /// Group components under a category name
    Category {
        name: String,
        component_types: Vec<String>,
    },
    /// Subclasses of `type_name` are pages
    PageBaseType { platform: String, type_name: String },
    /// Subclasses of `type_name` are controls
    ControlBaseType { platform: String, type_name: String },
    /// Declare a component for a type (possibly defined elsewhere)
    Component {
        type_name: String,
        display_name: Option<String>,
    },
}

/// A method or property that may produce a preview
#[derive(Clone)]
pub struct MemberInfo {
    pub name: String,
    pub return_type: Option<TypeRef>,
    pub parameter_count: usize,
    pub attributes: Vec<PreviewAttribute>,
    pub factory: Option<PreviewFactoryRef>,
}

impl MemberInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: None,
            parameter_count: 0,
            attributes: Vec::new(),
            factory: None,
        }
    }

    pub fn returns(mut self, return_type: TypeRef) -> Self {
        self.return_type = Some(return_type);
        self
    }

    pub fn with_parameters(mut self, count: usize) -> Self {
        self.parameter_count = count;
        self
    }

    pub fn with_attribute(mut self, attribute: PreviewAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_factory(mut self, factory: PreviewFactoryRef) -> Self {
        self.factory = Some(factory);
        self
    }
}

impl fmt::Debug for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberInfo")
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .field("parameter_count", &self.parameter_count)
            .field("attributes", &self.attributes)
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}

/// A declared type
#[derive(Clone)]
pub struct TypeInfo {
    pub full_name: String,
    /// Fully-qualified name of the direct base type
    pub base_type: Option<String>,
    pub attributes: Vec<TypeAttribute>,
    pub members: Vec<MemberInfo>,
    /// Parameterless constructor, when the type has one
    pub default_constructor: Option<PreviewFactoryRef>,
}

impl TypeInfo {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            base_type: None,
            attributes: Vec::new(),
            members: Vec::new(),
            default_constructor: None,
        }
    }

    pub fn extends(mut self, base_type: impl Into<String>) -> Self {
        self.base_type = Some(base_type.into());
        self
    }

    pub fn with_attribute(mut self, attribute: TypeAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_member(mut self, member: MemberInfo) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_default_constructor(mut self, factory: PreviewFactoryRef) -> Self {
        self.default_constructor = Some(factory);
        self
    }

    pub(crate) fn component_attributes(&self) -> Vec<&ComponentAttribute> {
        self.attributes
            .iter()
            .filter_map(|a| match a {
                TypeAttribute::Component(c) => Some(c),
                TypeAttribute::Preview(_) => None,
            })
            .collect()
    }

    pub(crate) fn preview_attributes(&self) -> Vec<&PreviewAttribute> {
        self.attributes
            .iter()
            .filter_map(|a| match a {
                TypeAttribute::Preview(p) => Some(p),
                TypeAttribute::Component(_) => None,
            })
            .collect()
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("full_name", &self.full_name)
            .field("base_type", &self.base_type)
            .field("attributes", &self.attributes)
            .field("members", &self.members)
            .field("has_default_constructor", &self.default_constructor.is_some())
            .finish()
    }
}

/// A loadable unit of types (assembly / module)
#[derive(Debug, Clone)]
pub struct AssemblyInfo {
    pub name: String,
    /// Names of referenced assemblies
    pub references: Vec<String>,
    pub types: Vec<TypeInfo>,
    pub attributes: Vec<AssemblyAttribute>,
}

impl AssemblyInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            references: Vec::new(),
            types: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn references<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_type(mut self, ty: TypeInfo) -> Self {
        self.types.push(ty);
        self
    }

    pub fn with_attribute(mut self, attribute: AssemblyAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// Introspector over explicitly registered, in-memory type graphs
///
/// Registering an assembly with an existing name replaces it, which is how a
/// host models a hot-reload recompilation.
#[derive(Debug, Default)]
pub struct InMemoryIntrospector {
    assemblies: RwLock<Vec<Arc<AssemblyInfo>>>,
}

impl InMemoryIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assembly(self, assembly: AssemblyInfo) -> Self {
        self.register_assembly(assembly);
        self
    }

    /// Add an assembly, replacing any previously registered one with the same name
    pub fn register_assembly(&self, assembly: AssemblyInfo) {
        let mut assemblies = self
            .assemblies
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let assembly = Arc::new(assembly);
        match assemblies.iter().position(|a| a.name == assembly.name) {
            Some(index) => assemblies[index] = assembly,
            None => assemblies.push(assembly),
        }
    }

    pub fn remove_assembly(&self, name: &str) -> bool {
        let mut assemblies = self
            .assemblies
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = assemblies.len();
        assemblies.retain(|a| a.name != name);
        assemblies.len() != before
    }
}

impl TypeIntrospector for InMemoryIntrospector {
    fn candidate_assemblies(&self) -> Vec<Arc<AssemblyInfo>> {
        self.assemblies
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
