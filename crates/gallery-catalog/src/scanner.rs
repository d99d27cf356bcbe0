//! Type scanner
//!
//! Builds a `CatalogSnapshot` from the assemblies a `TypeIntrospector`
//! reports. The scan runs in passes over the assemblies in dependency order:
//!
//! 1. Base-type declarations are added to the platform registry
//! 2. Explicitly annotated components are registered
//! 3. Assembly-level component declarations are registered
//! 4. Remaining types are matched by base-type chain
//! 5. Previews are attached to their owning components
//! 6. Components without previews get an auto-generated one
//! 7. Components are grouped into categories
//!
//! Anything malformed is skipped with a `ScanWarning`; one bad type never
//! prevents the rest of the catalog from being discovered.

use crate::base_types::BaseTypeRegistry;
use crate::introspection::{
    AssemblyAttribute, AssemblyInfo, ComponentAttribute, MemberInfo, PreviewAttribute, TypeInfo,
    TypeIntrospectorRef, TypeRef,
};
use crate::ScanWarning;
use gallery_config::ScannerConfig;
use gallery_core::{
    CatalogBuilder, CatalogConflict, CatalogSnapshot, Component, ComponentKind, Preview,
    PreviewFactoryRef, PreviewOrigin,
};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Generic wrappers whose single type argument names the previewed component
const ROUTE_PREVIEW_WRAPPERS: &[&str] = &["RoutePreview"];

/// Return types too general to identify a component
const OPAQUE_RETURN_TYPES: &[&str] = &["object", "System.Object"];

/// Predicate over assembly names; `true` excludes the assembly
pub type ExclusionFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Result of one scan
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub snapshot: Arc<CatalogSnapshot>,
    pub warnings: Vec<ScanWarning>,
}

/// Scans candidate assemblies into a catalog snapshot
#[derive(Clone)]
pub struct TypeScanner {
    introspector: TypeIntrospectorRef,
    exclusion_filter: Option<ExclusionFilter>,
    base_types: BaseTypeRegistry,
}

impl TypeScanner {
    /// Scanner with the default platform base types and no exclusions
    pub fn new(introspector: TypeIntrospectorRef) -> Self {
        Self {
            introspector,
            exclusion_filter: None,
            base_types: BaseTypeRegistry::with_defaults(),
        }
    }

    /// Scanner excluding the configured framework assembly prefixes
    pub fn from_config(introspector: TypeIntrospectorRef, config: &ScannerConfig) -> Self {
        let config = config.clone();
        Self::new(introspector).with_exclusion_filter(move |name| config.is_excluded(name))
    }

    pub fn with_exclusion_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.exclusion_filter = Some(Arc::new(filter));
        self
    }

    /// Replace the compiled-in base-type registry
    pub fn with_base_types(mut self, registry: BaseTypeRegistry) -> Self {
        self.base_types = registry;
        self
    }

    fn is_excluded(&self, assembly_name: &str) -> bool {
        self.exclusion_filter
            .as_ref()
            .is_some_and(|filter| filter(assembly_name))
    }

    /// Scan the current candidate assemblies
    pub fn scan(&self) -> ScanOutcome {
        let candidates: Vec<Arc<AssemblyInfo>> = self
            .introspector
            .candidate_assemblies()
            .into_iter()
            .filter(|assembly| {
                let excluded = self.is_excluded(&assembly.name);
                if excluded {
                    debug!(assembly = %assembly.name, "Skipping excluded assembly");
                }
                !excluded
            })
            .collect();

        let ordered = topological_order(&candidates);
        let mut pass = ScanPass::new(&ordered, self.base_types.clone());
        pass.run();
        let (snapshot, warnings) = pass.finish();

        for warning in &warnings {
            warn!(subject = warning.subject(), "{}", warning);
        }
        info!(
            assemblies = ordered.len(),
            components = snapshot.len(),
            previews = snapshot.preview_count(),
            warnings = warnings.len(),
            "Catalog scan complete"
        );

        ScanOutcome {
            snapshot: Arc::new(snapshot),
            warnings,
        }
    }
}

impl fmt::Debug for TypeScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeScanner")
            .field("has_exclusion_filter", &self.exclusion_filter.is_some())
            .field("base_types", &self.base_types.len())
            .finish()
    }
}

/// Order assemblies so dependencies come before dependents
///
/// Depth-first with a visited set: reference cycles are tolerated and
/// yield whatever partial order the traversal reaches. References to
/// assemblies outside the candidate set are ignored.
pub fn topological_order(assemblies: &[Arc<AssemblyInfo>]) -> Vec<Arc<AssemblyInfo>> {
    let by_name: HashMap<&str, &Arc<AssemblyInfo>> = assemblies
        .iter()
        .map(|a| (a.name.as_str(), a))
        .collect();

    let mut visited = HashSet::new();
    let mut ordered = Vec::with_capacity(assemblies.len());
    for assembly in assemblies {
        visit(assembly, &by_name, &mut visited, &mut ordered);
    }
    ordered
}

fn visit<'a>(
    assembly: &'a Arc<AssemblyInfo>,
    by_name: &HashMap<&'a str, &'a Arc<AssemblyInfo>>,
    visited: &mut HashSet<&'a str>,
    ordered: &mut Vec<Arc<AssemblyInfo>>,
) {
    if !visited.insert(assembly.name.as_str()) {
        return;
    }
    for reference in &assembly.references {
        if let Some(&dependency) = by_name.get(reference.as_str()) {
            visit(dependency, by_name, visited, ordered);
        }
    }
    ordered.push(Arc::clone(assembly));
}

enum ChainMatch {
    Found(ComponentKind),
    NoMatch,
    Cycle,
}

/// Walk `ty`'s base-type chain through the scanned types until a registered
/// platform base type is hit
fn walk_base_chain(
    ty: &TypeInfo,
    index: &HashMap<&str, &TypeInfo>,
    registry: &BaseTypeRegistry,
) -> ChainMatch {
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(ty.full_name.as_str());

    let mut current = ty.base_type.as_deref();
    while let Some(name) = current {
        if let Some(entry) = registry.lookup(name) {
            return ChainMatch::Found(entry.kind);
        }
        if !visited.insert(name) {
            return ChainMatch::Cycle;
        }
        current = index.get(name).and_then(|t| t.base_type.as_deref());
    }
    ChainMatch::NoMatch
}

fn is_route_wrapper(ty: &TypeRef) -> bool {
    ROUTE_PREVIEW_WRAPPERS.contains(&ty.simple_name())
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_ref().is_some_and(|v| v.trim().is_empty())
}

struct ScanPass<'a> {
    assemblies: &'a [Arc<AssemblyInfo>],
    index: HashMap<&'a str, &'a TypeInfo>,
    base_types: BaseTypeRegistry,
    builder: CatalogBuilder,
    /// Type-level category declarations, per assembly position
    type_categories: Vec<Vec<(String, String)>>,
    cycles_reported: HashSet<String>,
    warnings: Vec<ScanWarning>,
}

impl<'a> ScanPass<'a> {
    fn new(assemblies: &'a [Arc<AssemblyInfo>], base_types: BaseTypeRegistry) -> Self {
        Self {
            assemblies,
            index: HashMap::new(),
            base_types,
            builder: CatalogBuilder::new(),
            type_categories: vec![Vec::new(); assemblies.len()],
            cycles_reported: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    fn run(&mut self) {
        self.register_base_types();
        self.build_type_index();
        self.register_annotated_components();
        self.register_declared_components();
        self.register_inferred_components();
        self.register_previews();
        self.generate_default_previews();
        self.assign_categories();
    }

    fn finish(self) -> (CatalogSnapshot, Vec<ScanWarning>) {
        (self.builder.build(), self.warnings)
    }

    fn register_base_types(&mut self) {
        for assembly in self.assemblies {
            for attribute in &assembly.attributes {
                match attribute {
                    AssemblyAttribute::PageBaseType {
                        platform,
                        type_name,
                    } => {
                        self.base_types.register_page(platform, type_name);
                    }
                    AssemblyAttribute::ControlBaseType {
                        platform,
                        type_name,
                    } => {
                        self.base_types.register_control(platform, type_name);
                    }
                    _ => {}
                }
            }
        }
    }

    fn build_type_index(&mut self) {
        for assembly in self.assemblies {
            for ty in &assembly.types {
                self.index.entry(ty.full_name.as_str()).or_insert(ty);
            }
        }
    }

    fn classify(&mut self, ty: &TypeInfo) -> Option<ComponentKind> {
        match walk_base_chain(ty, &self.index, &self.base_types) {
            ChainMatch::Found(kind) => Some(kind),
            ChainMatch::NoMatch => None,
            ChainMatch::Cycle => {
                if self.cycles_reported.insert(ty.full_name.clone()) {
                    self.warnings
                        .push(ScanWarning::BaseTypeCycle(ty.full_name.clone()));
                }
                None
            }
        }
    }

    /// The single attribute of a kind, or `None` (with a warning when duplicated)
    fn single<'b, T>(
        &mut self,
        subject: &str,
        attributes: &[&'b T],
        attribute: &'static str,
    ) -> Option<&'b T> {
        match attributes {
            [] => None,
            [only] => Some(*only),
            _ => {
                self.warnings.push(ScanWarning::DuplicateAttribute {
                    subject: subject.to_string(),
                    attribute,
                    count: attributes.len(),
                });
                None
            }
        }
    }

    fn malformed(&mut self, subject: &str, reason: &str) {
        self.warnings.push(ScanWarning::MalformedAttribute {
            subject: subject.to_string(),
            reason: reason.to_string(),
        });
    }

    fn add_component(&mut self, component: Component) -> bool {
        match self.builder.add_component(component) {
            Ok(()) => true,
            Err(CatalogConflict::DuplicateComponent(name)) => {
                self.warnings.push(ScanWarning::DuplicateComponent(name));
                false
            }
            Err(other) => {
                debug!(conflict = %other, "Unexpected conflict registering component");
                false
            }
        }
    }

    fn register_annotated_components(&mut self) {
        let assemblies = self.assemblies;
        for (position, assembly) in assemblies.iter().enumerate() {
            for ty in &assembly.types {
                let attributes = ty.component_attributes();
                let Some(attribute) = self.single(&ty.full_name, &attributes, "component") else {
                    continue;
                };
                if let Some(component) = self.annotated_component(ty, attribute) {
                    let category = attribute.category.clone();
                    if self.add_component(component) {
                        if let Some(category) = category {
                            self.type_categories[position].push((category, ty.full_name.clone()));
                        }
                    }
                }
            }
        }
    }

    fn annotated_component(
        &mut self,
        ty: &TypeInfo,
        attribute: &ComponentAttribute,
    ) -> Option<Component> {
        if is_blank(&attribute.display_name) {
            self.malformed(&ty.full_name, "display name is empty");
            return None;
        }
        if is_blank(&attribute.category) {
            self.malformed(&ty.full_name, "category is empty");
            return None;
        }

        let kind = match attribute.kind {
            Some(kind) => kind,
            None => self.classify(ty).unwrap_or(ComponentKind::Unknown),
        };
        let mut component = Component::new(&ty.full_name)
            .with_kind(kind)
            .with_auto_generate_preview(attribute.auto_generate_preview.unwrap_or(true));
        if let Some(display_name) = &attribute.display_name {
            component = component.with_display_name(display_name);
        }
        Some(component)
    }

    fn register_declared_components(&mut self) {
        for assembly in self.assemblies {
            for attribute in &assembly.attributes {
                let AssemblyAttribute::Component {
                    type_name,
                    display_name,
                } = attribute
                else {
                    continue;
                };
                if type_name.trim().is_empty() {
                    self.malformed(&assembly.name, "component declaration has an empty type name");
                    continue;
                }
                if is_blank(display_name) {
                    self.malformed(type_name, "display name is empty");
                    continue;
                }

                let kind = match self.index.get(type_name.as_str()).copied() {
                    Some(ty) => self.classify(ty).unwrap_or(ComponentKind::Unknown),
                    None => ComponentKind::Unknown,
                };
                let mut component = Component::new(type_name).with_kind(kind);
                if let Some(display_name) = display_name {
                    component = component.with_display_name(display_name);
                }
                self.add_component(component);
            }
        }
    }

    fn register_inferred_components(&mut self) {
        for assembly in self.assemblies {
            for ty in &assembly.types {
                // Annotated types were decided in their own pass, even when rejected
                if !ty.component_attributes().is_empty() || self.builder.contains(&ty.full_name) {
                    continue;
                }
                if let Some(kind) = self.classify(ty) {
                    self.add_component(Component::new(&ty.full_name).with_kind(kind));
                }
            }
        }
    }

    fn register_previews(&mut self) {
        for assembly in self.assemblies {
            for ty in &assembly.types {
                self.register_type_preview(ty);
                for member in &ty.members {
                    self.register_member_preview(ty, member);
                }
            }
        }
    }

    fn valid_preview_attribute(&mut self, subject: &str, attribute: &PreviewAttribute) -> bool {
        if is_blank(&attribute.display_name) {
            self.malformed(subject, "display name is empty");
            return false;
        }
        if is_blank(&attribute.component) {
            self.malformed(subject, "component reference is empty");
            return false;
        }
        true
    }

    /// A preview annotation on a type previews its default constructor
    fn register_type_preview(&mut self, ty: &TypeInfo) {
        let attributes = ty.preview_attributes();
        let Some(attribute) = self.single(&ty.full_name, &attributes, "preview") else {
            return;
        };
        if !self.valid_preview_attribute(&ty.full_name, attribute) {
            return;
        }
        let Some(factory) = ty.default_constructor.clone() else {
            self.warnings
                .push(ScanWarning::MissingFactory(ty.full_name.clone()));
            return;
        };

        let (owner, origin) = match &attribute.component {
            Some(component) => (component.clone(), PreviewOrigin::Explicit),
            None => (ty.full_name.clone(), PreviewOrigin::DeclaringType),
        };
        self.attach_preview(
            &ty.full_name,
            owner,
            origin,
            attribute.display_name.as_deref(),
            factory,
        );
    }

    fn register_member_preview(&mut self, ty: &TypeInfo, member: &MemberInfo) {
        let key = format!("{}.{}", ty.full_name, member.name);
        let attributes: Vec<&PreviewAttribute> = member.attributes.iter().collect();
        let Some(attribute) = self.single(&key, &attributes, "preview") else {
            return;
        };
        if !self.valid_preview_attribute(&key, attribute) {
            return;
        }
        if member.parameter_count > 0 {
            self.warnings.push(ScanWarning::ParameterizedPreview {
                preview: key,
                count: member.parameter_count,
            });
            return;
        }
        let Some(factory) = member.factory.clone() else {
            self.warnings.push(ScanWarning::MissingFactory(key));
            return;
        };

        let (owner, origin) = match &attribute.component {
            Some(component) => (component.clone(), PreviewOrigin::Explicit),
            None => match self.infer_owner(member.return_type.as_ref()) {
                Ok(owner) => (owner, PreviewOrigin::ReturnType),
                Err(reason) => {
                    self.warnings
                        .push(ScanWarning::UnresolvedPreviewOwner { preview: key, reason });
                    return;
                }
            },
        };
        self.attach_preview(&key, owner, origin, attribute.display_name.as_deref(), factory);
    }

    /// Owning component from a factory's static return type
    fn infer_owner(&self, return_type: Option<&TypeRef>) -> Result<String, String> {
        let declared =
            return_type.ok_or_else(|| "factory has no declared return type".to_string())?;
        if declared.is_void() {
            return Err("factory returns void".to_string());
        }

        let target = if is_route_wrapper(declared) {
            match declared.generic_args.as_slice() {
                [only] => only,
                _ => {
                    return Err(format!(
                        "route preview wrapper '{}' must have exactly one type argument",
                        declared
                    ))
                }
            }
        } else {
            declared
        };

        if target.is_void() || OPAQUE_RETURN_TYPES.contains(&target.name.as_str()) {
            return Err(format!("return type '{}' does not identify a component", target));
        }
        if self.builder.contains(&target.name) || self.index.contains_key(target.name.as_str()) {
            Ok(target.name.clone())
        } else {
            Err(format!(
                "return type '{}' is neither a component nor a scanned type",
                target
            ))
        }
    }

    fn attach_preview(
        &mut self,
        key: &str,
        owner: String,
        origin: PreviewOrigin,
        display_name: Option<&str>,
        factory: PreviewFactoryRef,
    ) {
        self.ensure_owner(&owner);

        let mut preview = Preview::new(key, &owner, origin).with_factory(factory);
        if let Some(display_name) = display_name {
            preview = preview.with_display_name(display_name);
        }

        match self.builder.add_preview(preview) {
            Ok(()) => {}
            Err(CatalogConflict::DuplicatePreview { component, preview }) => {
                self.warnings
                    .push(ScanWarning::DuplicatePreview { component, preview });
            }
            Err(other) => debug!(conflict = %other, "Unexpected conflict attaching preview"),
        }
    }

    /// A preview may own a component nothing else declared; synthesize it
    fn ensure_owner(&mut self, owner: &str) {
        if self.builder.contains(owner) {
            return;
        }
        let kind = match self.index.get(owner).copied() {
            Some(ty) => self.classify(ty).unwrap_or(ComponentKind::Unknown),
            None => ComponentKind::Unknown,
        };
        debug!(component = owner, kind = %kind, "Synthesizing component for preview owner");
        self.add_component(Component::new(owner).with_kind(kind));
    }

    fn generate_default_previews(&mut self) {
        for name in self.builder.component_names() {
            let Some(component) = self.builder.component(&name) else {
                continue;
            };
            if !component.previews().is_empty() || !component.auto_generate_preview() {
                continue;
            }
            let Some(factory) = self
                .index
                .get(name.as_str())
                .and_then(|ty| ty.default_constructor.clone())
            else {
                continue;
            };

            let preview = Preview::new(&name, &name, PreviewOrigin::AutoGenerated)
                .with_display_name(component.display_name())
                .with_factory(factory);
            if let Err(conflict) = self.builder.add_preview(preview) {
                debug!(%conflict, "Unexpected conflict adding auto-generated preview");
            }
        }
    }

    fn assign_categories(&mut self) {
        let assemblies = self.assemblies;
        for (position, assembly) in assemblies.iter().enumerate() {
            for attribute in &assembly.attributes {
                let AssemblyAttribute::Category {
                    name,
                    component_types,
                } = attribute
                else {
                    continue;
                };
                if name.trim().is_empty() {
                    self.malformed(&assembly.name, "category name is empty");
                    continue;
                }
                self.builder.add_category(name);
                for component in component_types {
                    self.assign_category(name, component);
                }
            }

            for (category, component) in std::mem::take(&mut self.type_categories[position]) {
                self.assign_category(&category, &component);
            }
        }
    }

    fn assign_category(&mut self, category: &str, component: &str) {
        match self.builder.add_to_category(category, component) {
            Ok(()) => {}
            // Repeating the same membership is harmless
            Err(CatalogConflict::AlreadyCategorized {
                category: existing, ..
            }) if existing == category => {}
            Err(CatalogConflict::AlreadyCategorized {
                component,
                category: existing,
            }) => self.warnings.push(ScanWarning::DuplicateCategoryMember {
                component,
                category: category.to_string(),
                existing,
            }),
            Err(CatalogConflict::UnknownComponent(component)) => {
                self.warnings.push(ScanWarning::UnknownCategoryMember {
                    category: category.to_string(),
                    component,
                })
            }
            Err(other) => debug!(conflict = %other, "Unexpected conflict assigning category"),
        }
    }
}
