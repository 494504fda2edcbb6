//! Prototype type descriptions.
//!
//! A [`PrototypeDef`] is the template for synthesis: an interface or a
//! non-sealed class declared as data, with behavior referenced through
//! registered function handles. The builder API mirrors incremental class
//! construction; a definition is immutable once registered with the engine.

use serde::{Deserialize, Serialize};

use crate::member::{ConstructorDef, EventDef, FieldDef, MethodDef, PropertyDef, Visibility};

/// Name of the built-in change-notification interface.
pub const NOTIFY_INTERFACE: &str = "Notifying";

/// Name of the notification channel's event.
pub const NOTIFY_EVENT: &str = "changed";

/// Conventional names of a reusable notification raiser method: concrete,
/// inheritable, one string parameter, no return value.
pub const RAISER_NAMES: &[&str] = &[
    "raise_changed",
    "on_property_changed",
    "notify_property_changed",
];

/// Whether a prototype is an interface or a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrototypeKind {
    /// Interface prototype: all members abstract, no constructors
    Interface,
    /// Class prototype: may mix concrete and abstract members
    Class,
}

/// A prototype type description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrototypeDef {
    /// Type name (unique within a registry)
    pub name: String,
    /// Interface or class
    pub kind: PrototypeKind,
    /// Type visibility
    pub visibility: Visibility,
    /// Sealed types cannot be synthesized from
    pub is_sealed: bool,
    /// Value types cannot be synthesized from
    pub is_value_type: bool,
    /// Unbound generic parameter names; must be empty for synthesis
    pub generic_params: Vec<String>,
    /// Parent interfaces (extended by an interface, implemented by a class)
    pub parents: Vec<String>,
    /// Base class name (class prototypes only)
    pub base: Option<String>,
    /// Instance fields backing concrete members (class prototypes only)
    pub fields: Vec<FieldDef>,
    /// Declared constructors (class prototypes only)
    pub constructors: Vec<ConstructorDef>,
    /// Declared properties
    pub properties: Vec<PropertyDef>,
    /// Declared methods
    pub methods: Vec<MethodDef>,
    /// Declared events
    pub events: Vec<EventDef>,
}

impl PrototypeDef {
    fn empty(name: &str, kind: PrototypeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            visibility: Visibility::Public,
            is_sealed: false,
            is_value_type: false,
            generic_params: Vec::new(),
            parents: Vec::new(),
            base: None,
            fields: Vec::new(),
            constructors: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Start an interface prototype
    pub fn interface(name: &str) -> Self {
        Self::empty(name, PrototypeKind::Interface)
    }

    /// Start a class prototype
    pub fn class(name: &str) -> Self {
        Self::empty(name, PrototypeKind::Class)
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark the type as sealed
    pub fn sealed(mut self) -> Self {
        self.is_sealed = true;
        self
    }

    /// Mark the type as a value type
    pub fn value_type(mut self) -> Self {
        self.is_value_type = true;
        self
    }

    /// Declare unbound generic parameters
    pub fn with_generic_params(mut self, params: &[&str]) -> Self {
        self.generic_params = params.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add a parent interface
    pub fn extends(mut self, parent: &str) -> Self {
        if !self.parents.iter().any(|p| p == parent) {
            self.parents.push(parent.to_string());
        }
        self
    }

    /// Set the base class (class prototypes only)
    pub fn with_base(mut self, base: &str) -> Self {
        self.base = Some(base.to_string());
        self
    }

    /// Add an instance field
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a constructor
    pub fn with_constructor(mut self, ctor: ConstructorDef) -> Self {
        self.constructors.push(ctor);
        self
    }

    /// Add a property
    pub fn with_property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a method
    pub fn with_method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Add an event
    pub fn with_event(mut self, event: EventDef) -> Self {
        self.events.push(event);
        self
    }

    /// Whether this is an interface prototype
    pub fn is_interface(&self) -> bool {
        self.kind == PrototypeKind::Interface
    }

    /// Look up a declared property by name
    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Look up a declared method by name
    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Look up a declared event by name
    pub fn event(&self, name: &str) -> Option<&EventDef> {
        self.events.iter().find(|e| e.name == name)
    }
}

/// The built-in change-notification interface: a single abstract event
/// through which observers learn of property changes.
pub fn notifying_interface() -> PrototypeDef {
    PrototypeDef::interface(NOTIFY_INTERFACE).with_event(EventDef::abstract_(NOTIFY_EVENT))
}
