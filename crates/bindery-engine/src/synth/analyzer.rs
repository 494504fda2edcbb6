//! Prototype analysis.
//!
//! Inspects a prototype definition and produces a closed, de-duplicated
//! descriptor of every member reachable and overridable from outside the
//! defining unit. The traversal is breadth-first over the interface closure
//! (interface prototypes) or the base-class chain plus implemented
//! interfaces (class prototypes); members are merged by signature, so a
//! member reachable through two parent interfaces is described once.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use bindery_model::{
    ConstructorDef, EventDef, FieldDef, MetadataStore, MethodDef, PropertyDef, PrototypeDef,
    PrototypeKind, Signature, Visibility,
};

use crate::error::{SynthError, SynthResult};
use crate::registry::PrototypeRegistry;

/// A property in the closure, with annotation data merged in.
#[derive(Debug, Clone)]
pub struct PropertyView {
    /// The property declaration
    pub def: PropertyDef,
    /// Name of the prototype that declared it
    pub declared_by: String,
    /// Related property names: declaration-order union of the definition's
    /// list and the annotation store's declarations
    pub related: Vec<String>,
    /// Whether the property carries the bindable annotation
    pub bindable_tag: bool,
}

/// A method in the closure.
#[derive(Debug, Clone)]
pub struct MethodView {
    /// The method declaration
    pub def: MethodDef,
    /// Name of the prototype that declared it
    pub declared_by: String,
}

/// An event in the closure.
#[derive(Debug, Clone)]
pub struct EventView {
    /// The event declaration
    pub def: EventDef,
    /// Name of the prototype that declared it
    pub declared_by: String,
}

/// One member of the closed prototype surface.
#[derive(Debug, Clone)]
pub enum MemberView {
    /// Property member
    Property(PropertyView),
    /// Method member
    Method(MethodView),
    /// Event member
    Event(EventView),
}

impl MemberView {
    /// Member identity
    pub fn signature(&self) -> Signature {
        match self {
            MemberView::Property(view) => view.def.signature(),
            MemberView::Method(view) => view.def.signature(),
            MemberView::Event(view) => view.def.signature(),
        }
    }

    fn is_abstract(&self) -> bool {
        match self {
            MemberView::Property(view) => view.def.is_abstract(),
            MemberView::Method(view) => view.def.is_abstract(),
            MemberView::Event(view) => view.def.is_abstract(),
        }
    }
}

/// Read-only description of a prototype's closed member surface.
///
/// Built once per synthesis request and discarded after emission.
#[derive(Debug)]
pub struct PrototypeDescriptor {
    /// Prototype name
    pub name: String,
    /// Interface or class
    pub kind: PrototypeKind,
    /// Accessible constructors available for forwarding
    pub constructors: Vec<ConstructorDef>,
    /// Concrete field layout inherited from the class chain, base-first
    pub base_fields: Vec<FieldDef>,
    /// Members in traversal order
    pub members: Vec<MemberView>,
    /// Names of every type in the transitive closure, traversal order
    pub closure: Vec<String>,
    member_index: FxHashMap<Signature, usize>,
}

impl PrototypeDescriptor {
    /// Look up a member by signature
    pub fn member(&self, signature: &Signature) -> Option<&MemberView> {
        self.member_index
            .get(signature)
            .map(|&index| &self.members[index])
    }

    /// Iterate the property members
    pub fn properties(&self) -> impl Iterator<Item = &PropertyView> {
        self.members.iter().filter_map(|m| match m {
            MemberView::Property(view) => Some(view),
            _ => None,
        })
    }

    /// Iterate the method members
    pub fn methods(&self) -> impl Iterator<Item = &MethodView> {
        self.members.iter().filter_map(|m| match m {
            MemberView::Method(view) => Some(view),
            _ => None,
        })
    }

    /// Iterate the event members
    pub fn events(&self) -> impl Iterator<Item = &EventView> {
        self.members.iter().filter_map(|m| match m {
            MemberView::Event(view) => Some(view),
            _ => None,
        })
    }

    /// Look up an event by name
    pub fn event(&self, name: &str) -> Option<&EventView> {
        self.events().find(|e| e.def.name == name)
    }

    /// Whether `name` appears in the transitive closure
    pub fn has_in_closure(&self, name: &str) -> bool {
        self.closure.iter().any(|n| n == name)
    }
}

fn invalid(prototype: &str, reason: &str) -> SynthError {
    SynthError::InvalidPrototype {
        prototype: prototype.to_string(),
        reason: reason.to_string(),
    }
}

/// Analyze a registered prototype into a [`PrototypeDescriptor`].
pub fn analyze(
    registry: &PrototypeRegistry,
    metadata: &MetadataStore,
    name: &str,
) -> SynthResult<PrototypeDescriptor> {
    let root = registry
        .get(name)
        .ok_or_else(|| SynthError::UnknownPrototype {
            name: name.to_string(),
        })?;

    if !root.visibility.is_public() {
        return Err(invalid(name, "not visible outside its defining unit"));
    }
    if root.is_sealed {
        return Err(invalid(name, "sealed types cannot be synthesized from"));
    }
    if root.is_value_type {
        return Err(invalid(name, "value types cannot be synthesized from"));
    }
    if !root.generic_params.is_empty() {
        return Err(invalid(name, "unresolved generic parameters"));
    }

    let constructors: Vec<ConstructorDef> = root
        .constructors
        .iter()
        .filter(|c| c.visibility.is_accessible_outside())
        .cloned()
        .collect();
    if root.kind == PrototypeKind::Class && constructors.is_empty() {
        return Err(invalid(name, "no accessible constructor to forward to"));
    }

    let mut analyzer = ClosureAnalyzer {
        registry,
        metadata,
        root: name.to_string(),
        closure: Vec::new(),
        visited: FxHashSet::default(),
        members: Vec::new(),
        member_index: FxHashMap::default(),
        class_chain: Vec::new(),
    };
    analyzer.traverse(&root)?;

    // Field layout of the class chain, base-first, so that a prototype's
    // constructor and accessor bodies see stable indices.
    let mut base_fields = Vec::new();
    for class_name in analyzer.class_chain.iter().rev() {
        if let Some(def) = registry.get(class_name) {
            base_fields.extend(def.fields.iter().cloned());
        }
    }

    Ok(PrototypeDescriptor {
        name: name.to_string(),
        kind: root.kind,
        constructors,
        base_fields,
        members: analyzer.members,
        closure: analyzer.closure,
        member_index: analyzer.member_index,
    })
}

struct ClosureAnalyzer<'a> {
    registry: &'a PrototypeRegistry,
    metadata: &'a MetadataStore,
    root: String,
    closure: Vec<String>,
    visited: FxHashSet<String>,
    members: Vec<MemberView>,
    member_index: FxHashMap<Signature, usize>,
    class_chain: Vec<String>,
}

impl ClosureAnalyzer<'_> {
    fn traverse(&mut self, root: &PrototypeDef) -> SynthResult<()> {
        let mut queue = VecDeque::new();
        queue.push_back(root.name.clone());

        while let Some(current_name) = queue.pop_front() {
            if !self.visited.insert(current_name.clone()) {
                continue;
            }
            let current = self.registry.get(&current_name).ok_or_else(|| {
                SynthError::UnknownPrototype {
                    name: current_name.clone(),
                }
            })?;
            self.closure.push(current_name.clone());
            if current.kind == PrototypeKind::Class {
                self.class_chain.push(current_name.clone());
            }

            self.collect(&current)?;

            if let Some(base) = &current.base {
                queue.push_back(base.clone());
            }
            for parent in &current.parents {
                queue.push_back(parent.clone());
            }
        }
        Ok(())
    }

    fn collect(&mut self, proto: &PrototypeDef) -> SynthResult<()> {
        for property in &proto.properties {
            if !property.is_accessible() {
                continue;
            }
            let related = self.merged_related(proto, property);
            let bindable_tag = self.metadata.is_bindable(&self.root, &property.name)
                || self.metadata.is_bindable(&proto.name, &property.name);
            self.merge(MemberView::Property(PropertyView {
                def: property.clone(),
                declared_by: proto.name.clone(),
                related,
                bindable_tag,
            }))?;
        }
        for method in &proto.methods {
            if !method.modifiers.visibility.is_accessible_outside() {
                continue;
            }
            self.merge(MemberView::Method(MethodView {
                def: method.clone(),
                declared_by: proto.name.clone(),
            }))?;
        }
        for event in &proto.events {
            if !event.modifiers.visibility.is_accessible_outside() {
                continue;
            }
            self.merge(MemberView::Event(EventView {
                def: event.clone(),
                declared_by: proto.name.clone(),
            }))?;
        }
        Ok(())
    }

    /// Union of the definition's related list and the annotation store's,
    /// preserving declaration order and dropping duplicates.
    fn merged_related(&self, proto: &PrototypeDef, property: &PropertyDef) -> Vec<String> {
        let mut related = property.related.clone();
        for source in [&self.root, &proto.name] {
            for extra in self.metadata.related(source, &property.name) {
                if !related.contains(&extra) {
                    related.push(extra);
                }
            }
        }
        related
    }

    fn merge(&mut self, incoming: MemberView) -> SynthResult<()> {
        let signature = incoming.signature();
        match self.member_index.get(&signature).copied() {
            None => {
                self.member_index.insert(signature, self.members.len());
                self.members.push(incoming);
            }
            Some(index) => {
                let existing = &self.members[index];
                if !compatible(existing, &incoming) {
                    return Err(SynthError::AmbiguousMember {
                        prototype: self.root.clone(),
                        member: signature.to_string(),
                    });
                }
                // A concrete declaration implements an abstract one found
                // elsewhere in the closure, whichever is visited first.
                if existing.is_abstract() && !incoming.is_abstract() {
                    self.members[index] = incoming;
                }
            }
        }
        Ok(())
    }
}

/// Whether two declarations under one signature can collapse to a single
/// classification entry.
fn compatible(existing: &MemberView, incoming: &MemberView) -> bool {
    match (existing, incoming) {
        (MemberView::Property(a), MemberView::Property(b)) => {
            a.def.value_type == b.def.value_type
        }
        (MemberView::Method(a), MemberView::Method(b)) => a.def.return_type == b.def.return_type,
        (MemberView::Event(_), MemberView::Event(_)) => true,
        _ => false,
    }
}

/// Convenience check used by the factory: whether any accessible
/// constructor is public (instantiable by an outside caller).
pub fn has_public_constructor(constructors: &[ConstructorDef]) -> bool {
    constructors
        .iter()
        .any(|c| c.visibility == Visibility::Public)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_model::{notifying_interface, AccessorDef, FunctionId, ParamDef, TypeTag};

    fn registry_with(defs: Vec<PrototypeDef>) -> PrototypeRegistry {
        let registry = PrototypeRegistry::new();
        registry.register(notifying_interface());
        for def in defs {
            registry.register(def);
        }
        registry
    }

    #[test]
    fn test_rejects_sealed_prototype() {
        let registry = registry_with(vec![PrototypeDef::class("Widget")
            .sealed()
            .with_constructor(ConstructorDef::new(vec![]))]);
        let err = analyze(&registry, &MetadataStore::new(), "Widget").unwrap_err();
        assert!(matches!(err, SynthError::InvalidPrototype { .. }));
    }

    #[test]
    fn test_rejects_internal_prototype() {
        let registry = registry_with(vec![
            PrototypeDef::interface("Hidden").with_visibility(Visibility::Internal)
        ]);
        let err = analyze(&registry, &MetadataStore::new(), "Hidden").unwrap_err();
        assert!(matches!(err, SynthError::InvalidPrototype { .. }));
    }

    #[test]
    fn test_rejects_value_type_and_open_generics() {
        let registry = registry_with(vec![
            PrototypeDef::class("Point")
                .value_type()
                .with_constructor(ConstructorDef::new(vec![])),
            PrototypeDef::interface("Container").with_generic_params(&["T"]),
        ]);
        assert!(analyze(&registry, &MetadataStore::new(), "Point").is_err());
        assert!(analyze(&registry, &MetadataStore::new(), "Container").is_err());
    }

    #[test]
    fn test_class_requires_forwardable_constructor() {
        let registry = registry_with(vec![PrototypeDef::class("Orphan")]);
        let err = analyze(&registry, &MetadataStore::new(), "Orphan").unwrap_err();
        assert!(matches!(err, SynthError::InvalidPrototype { .. }));

        // Private constructors do not count.
        let registry = registry_with(vec![PrototypeDef::class("Locked").with_constructor(
            ConstructorDef::new(vec![]).with_visibility(Visibility::Private),
        )]);
        assert!(analyze(&registry, &MetadataStore::new(), "Locked").is_err());
    }

    #[test]
    fn test_unknown_prototype() {
        let registry = registry_with(vec![]);
        let err = analyze(&registry, &MetadataStore::new(), "Ghost").unwrap_err();
        assert_eq!(
            err,
            SynthError::UnknownPrototype {
                name: "Ghost".to_string()
            }
        );
    }

    #[test]
    fn test_diamond_closure_collapses_to_one_member() {
        let registry = registry_with(vec![
            PrototypeDef::interface("Shape")
                .with_property(PropertyDef::new("Area", TypeTag::F64).read_only()),
            PrototypeDef::interface("Fillable").extends("Shape"),
            PrototypeDef::interface("Outlined").extends("Shape"),
            PrototypeDef::interface("Figure").extends("Fillable").extends("Outlined"),
        ]);
        let descriptor = analyze(&registry, &MetadataStore::new(), "Figure").unwrap();

        assert_eq!(descriptor.properties().count(), 1);
        assert_eq!(
            descriptor.closure,
            vec!["Figure", "Fillable", "Outlined", "Shape"]
        );
    }

    #[test]
    fn test_incompatible_diamond_is_ambiguous() {
        let registry = registry_with(vec![
            PrototypeDef::interface("Measured")
                .with_property(PropertyDef::new("Extent", TypeTag::F64)),
            PrototypeDef::interface("Counted")
                .with_property(PropertyDef::new("Extent", TypeTag::I32)),
            PrototypeDef::interface("Both").extends("Measured").extends("Counted"),
        ]);
        let err = analyze(&registry, &MetadataStore::new(), "Both").unwrap_err();
        assert!(matches!(err, SynthError::AmbiguousMember { .. }));
    }

    #[test]
    fn test_concrete_implementation_wins_over_abstract_declaration() {
        let getter = FunctionId(0);
        let registry = registry_with(vec![
            PrototypeDef::interface("Named")
                .with_property(PropertyDef::new("Name", TypeTag::Str).read_only()),
            PrototypeDef::class("Person")
                .extends("Named")
                .with_constructor(ConstructorDef::new(vec![]))
                .with_property(
                    PropertyDef::new("Name", TypeTag::Str)
                        .read_only()
                        .with_getter(AccessorDef::virtual_(getter)),
                ),
        ]);
        let descriptor = analyze(&registry, &MetadataStore::new(), "Person").unwrap();

        let view = descriptor.properties().next().unwrap();
        assert_eq!(view.declared_by, "Person");
        assert!(!view.def.is_abstract());
    }

    #[test]
    fn test_private_members_stay_out_of_the_surface() {
        let registry = registry_with(vec![PrototypeDef::class("Vault")
            .with_constructor(ConstructorDef::new(vec![]))
            .with_property(
                PropertyDef::new("Secret", TypeTag::Str)
                    .with_getter(AccessorDef::abstract_().with_visibility(Visibility::Private))
                    .with_setter(AccessorDef::abstract_().with_visibility(Visibility::Private)),
            )
            .with_method(MethodDef::concrete(
                "audit",
                vec![],
                None,
                FunctionId(7),
            ))]);
        let descriptor = analyze(&registry, &MetadataStore::new(), "Vault").unwrap();

        assert_eq!(descriptor.properties().count(), 0);
        assert_eq!(descriptor.methods().count(), 1);
    }

    #[test]
    fn test_base_fields_laid_out_base_first() {
        let registry = registry_with(vec![
            PrototypeDef::class("Base")
                .with_constructor(ConstructorDef::new(vec![]))
                .with_field(FieldDef::new("a", TypeTag::I32)),
            PrototypeDef::class("Derived")
                .with_base("Base")
                .with_constructor(ConstructorDef::new(vec![]))
                .with_field(FieldDef::new("b", TypeTag::I32)),
        ]);
        let descriptor = analyze(&registry, &MetadataStore::new(), "Derived").unwrap();

        let names: Vec<&str> = descriptor
            .base_fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_related_merged_from_annotations() {
        let mut metadata = MetadataStore::new();
        metadata.set_related("Rectangle", "Length", &["Size", "Perimeter"]);

        let registry = registry_with(vec![PrototypeDef::class("Rectangle")
            .with_constructor(ConstructorDef::new(vec![]))
            .with_property(PropertyDef::new("Length", TypeTag::I32).with_related(&["Size"]))]);
        let descriptor = analyze(&registry, &metadata, "Rectangle").unwrap();

        let view = descriptor.properties().next().unwrap();
        assert_eq!(view.related, vec!["Size", "Perimeter"]);
    }

    #[test]
    fn test_constructor_with_params_enumerated() {
        let registry = registry_with(vec![PrototypeDef::class("Rect")
            .with_constructor(ConstructorDef::new(vec![
                ParamDef::new("length", TypeTag::I32),
                ParamDef::new("width", TypeTag::I32),
            ]))
            .with_constructor(
                ConstructorDef::new(vec![]).with_visibility(Visibility::Protected),
            )]);
        let descriptor = analyze(&registry, &MetadataStore::new(), "Rect").unwrap();

        assert_eq!(descriptor.constructors.len(), 2);
        assert!(has_public_constructor(&descriptor.constructors));
    }
}
