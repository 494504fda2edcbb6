//! Member definitions for prototype descriptions.
//!
//! A prototype declares its surface as properties, methods, events, and
//! constructors. Each member carries [`Modifiers`] that the synthesis engine
//! reads to decide visibility, overridability, and abstractness. Concrete
//! members reference their behavior by [`FunctionId`] into the engine's
//! native-function registry; abstract members carry no body.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::{TypeTag, Value};

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    /// Visible everywhere
    Public,
    /// Visible to the type and its derivations
    Protected,
    /// Visible within the defining unit only
    Internal,
    /// Visible within the type only
    Private,
}

impl Visibility {
    /// Whether a member with this visibility can be seen and overridden
    /// from outside its defining unit
    pub fn is_accessible_outside(&self) -> bool {
        matches!(self, Visibility::Public | Visibility::Protected)
    }

    /// Whether this is public visibility
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Public
    }
}

/// Modifier flags for a member declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    /// Member visibility
    pub visibility: Visibility,
    /// Abstract member (no body, must be implemented)
    pub is_abstract: bool,
    /// Virtual member (overridable by derivations)
    pub is_virtual: bool,
    /// Final member (explicitly not overridable)
    pub is_final: bool,
}

impl Modifiers {
    /// Public, concrete, non-virtual
    pub fn public() -> Self {
        Self {
            visibility: Visibility::Public,
            is_abstract: false,
            is_virtual: false,
            is_final: false,
        }
    }

    /// Public and virtual
    pub fn virtual_() -> Self {
        Self {
            is_virtual: true,
            ..Self::public()
        }
    }

    /// Public and abstract (abstract implies virtual)
    pub fn abstract_() -> Self {
        Self {
            is_abstract: true,
            is_virtual: true,
            ..Self::public()
        }
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark as final
    pub fn as_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// Whether a derivation may override this member
    pub fn is_overridable(&self) -> bool {
        (self.is_virtual || self.is_abstract) && !self.is_final
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::public()
    }
}

/// Which kind of member a signature identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberKind {
    /// Property (simple or indexed)
    Property,
    /// Method
    Method,
    /// Event
    Event,
}

/// Member identity: name, kind, and parameter types.
///
/// Two declarations with the same signature collapse to one classification
/// entry; a member reachable through two parent interfaces is therefore
/// handled exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    /// Member name
    pub name: String,
    /// Member kind
    pub kind: MemberKind,
    /// Parameter type tags (index parameters for properties)
    pub params: Vec<TypeTag>,
}

impl Signature {
    /// Signature of a simple property
    pub fn property(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: MemberKind::Property,
            params: Vec::new(),
        }
    }

    /// Signature of an indexed property
    pub fn indexed_property(name: &str, params: Vec<TypeTag>) -> Self {
        Self {
            name: name.to_string(),
            kind: MemberKind::Property,
            params,
        }
    }

    /// Signature of a method
    pub fn method(name: &str, params: Vec<TypeTag>) -> Self {
        Self {
            name: name.to_string(),
            kind: MemberKind::Method,
            params,
        }
    }

    /// Signature of an event
    pub fn event(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: MemberKind::Event,
            params: Vec::new(),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.params.is_empty() {
            write!(f, "(")?;
            for (i, p) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", p)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Handle to a registered native function carrying member behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionId(pub usize);

/// Parameter declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub type_tag: TypeTag,
}

impl ParamDef {
    /// Create a parameter declaration
    pub fn new(name: &str, type_tag: TypeTag) -> Self {
        Self {
            name: name.to_string(),
            type_tag,
        }
    }
}

/// One accessor (getter or setter) of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessorDef {
    /// Accessor modifiers
    pub modifiers: Modifiers,
    /// Behavior of a concrete accessor; `None` for abstract accessors
    pub body: Option<FunctionId>,
}

impl AccessorDef {
    /// Abstract accessor (no body)
    pub fn abstract_() -> Self {
        Self {
            modifiers: Modifiers::abstract_(),
            body: None,
        }
    }

    /// Concrete virtual accessor with a registered body
    pub fn virtual_(body: FunctionId) -> Self {
        Self {
            modifiers: Modifiers::virtual_(),
            body: Some(body),
        }
    }

    /// Concrete non-virtual accessor with a registered body
    pub fn sealed(body: FunctionId) -> Self {
        Self {
            modifiers: Modifiers::public(),
            body: Some(body),
        }
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.modifiers.visibility = visibility;
        self
    }

    /// Whether this accessor is abstract
    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract || self.body.is_none()
    }
}

/// Property declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    /// Property name
    pub name: String,
    /// Value type
    pub value_type: TypeTag,
    /// Index parameters; empty for simple properties
    pub index_params: Vec<ParamDef>,
    /// Getter; `None` for set-only properties
    pub getter: Option<AccessorDef>,
    /// Setter; `None` for get-only properties
    pub setter: Option<AccessorDef>,
    /// Names of dependent properties that must also notify when this
    /// property changes, in declaration order
    pub related: Vec<String>,
}

impl PropertyDef {
    /// Abstract read-write property
    pub fn new(name: &str, value_type: TypeTag) -> Self {
        Self {
            name: name.to_string(),
            value_type,
            index_params: Vec::new(),
            getter: Some(AccessorDef::abstract_()),
            setter: Some(AccessorDef::abstract_()),
            related: Vec::new(),
        }
    }

    /// Drop the setter, making the property get-only
    pub fn read_only(mut self) -> Self {
        self.setter = None;
        self
    }

    /// Replace the getter
    pub fn with_getter(mut self, getter: AccessorDef) -> Self {
        self.getter = Some(getter);
        self
    }

    /// Replace the setter
    pub fn with_setter(mut self, setter: AccessorDef) -> Self {
        self.setter = Some(setter);
        self
    }

    /// Make the property indexed
    pub fn indexed(mut self, params: Vec<ParamDef>) -> Self {
        self.index_params = params;
        self
    }

    /// Declare dependent properties
    pub fn with_related(mut self, related: &[&str]) -> Self {
        self.related = related.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Whether the property takes index parameters
    pub fn is_indexed(&self) -> bool {
        !self.index_params.is_empty()
    }

    /// Whether the property can be written
    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }

    /// Whether any accessor is abstract
    pub fn is_abstract(&self) -> bool {
        self.getter.as_ref().is_some_and(|a| a.is_abstract())
            || self.setter.as_ref().is_some_and(|a| a.is_abstract())
    }

    /// Whether every present accessor may be overridden
    pub fn is_fully_overridable(&self) -> bool {
        self.getter
            .as_ref()
            .map_or(true, |a| a.modifiers.is_overridable())
            && self
                .setter
                .as_ref()
                .map_or(true, |a| a.modifiers.is_overridable())
    }

    /// Whether every present accessor is visible outside the defining unit
    pub fn is_accessible(&self) -> bool {
        self.getter
            .as_ref()
            .map_or(true, |a| a.modifiers.visibility.is_accessible_outside())
            && self
                .setter
                .as_ref()
                .map_or(true, |a| a.modifiers.visibility.is_accessible_outside())
    }

    /// Member signature of this property
    pub fn signature(&self) -> Signature {
        Signature::indexed_property(
            &self.name,
            self.index_params.iter().map(|p| p.type_tag).collect(),
        )
    }
}

/// Method declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    /// Method name
    pub name: String,
    /// Parameters
    pub params: Vec<ParamDef>,
    /// Return type; `None` for void
    pub return_type: Option<TypeTag>,
    /// Method modifiers
    pub modifiers: Modifiers,
    /// Behavior of a concrete method; `None` for abstract methods
    pub body: Option<FunctionId>,
}

impl MethodDef {
    /// Abstract method
    pub fn abstract_(name: &str, params: Vec<ParamDef>, return_type: Option<TypeTag>) -> Self {
        Self {
            name: name.to_string(),
            params,
            return_type,
            modifiers: Modifiers::abstract_(),
            body: None,
        }
    }

    /// Concrete virtual method with a registered body
    pub fn concrete(
        name: &str,
        params: Vec<ParamDef>,
        return_type: Option<TypeTag>,
        body: FunctionId,
    ) -> Self {
        Self {
            name: name.to_string(),
            params,
            return_type,
            modifiers: Modifiers::virtual_(),
            body: Some(body),
        }
    }

    /// Replace the modifiers
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether this method is abstract
    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract || self.body.is_none()
    }

    /// Member signature of this method
    pub fn signature(&self) -> Signature {
        Signature::method(&self.name, self.params.iter().map(|p| p.type_tag).collect())
    }
}

/// Event declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDef {
    /// Event name
    pub name: String,
    /// Accessor modifiers
    pub modifiers: Modifiers,
    /// Whether the subscribe/unsubscribe accessors have concrete bodies
    pub is_concrete: bool,
}

impl EventDef {
    /// Abstract event (accessors must be synthesized)
    pub fn abstract_(name: &str) -> Self {
        Self {
            name: name.to_string(),
            modifiers: Modifiers::abstract_(),
            is_concrete: false,
        }
    }

    /// Concrete event with working accessors
    pub fn concrete(name: &str) -> Self {
        Self {
            name: name.to_string(),
            modifiers: Modifiers::virtual_(),
            is_concrete: true,
        }
    }

    /// Whether the event accessors are abstract
    pub fn is_abstract(&self) -> bool {
        !self.is_concrete
    }

    /// Member signature of this event
    pub fn signature(&self) -> Signature {
        Signature::event(&self.name)
    }
}

/// Constructor declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDef {
    /// Parameters
    pub params: Vec<ParamDef>,
    /// Constructor visibility
    pub visibility: Visibility,
    /// Initialization behavior; `None` leaves fields at their defaults
    pub body: Option<FunctionId>,
}

impl ConstructorDef {
    /// Public constructor with the given parameters
    pub fn new(params: Vec<ParamDef>) -> Self {
        Self {
            params,
            visibility: Visibility::Public,
            body: None,
        }
    }

    /// Attach an initialization body
    pub fn with_body(mut self, body: FunctionId) -> Self {
        self.body = Some(body);
        self
    }

    /// Set visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Instance field backing a class prototype's concrete members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Field type
    pub type_tag: TypeTag,
    /// Initial value; defaults to the type's default
    pub initial: Option<Value>,
}

impl FieldDef {
    /// Create a field declaration
    pub fn new(name: &str, type_tag: TypeTag) -> Self {
        Self {
            name: name.to_string(),
            type_tag,
            initial: None,
        }
    }

    /// Set the initial value
    pub fn with_initial(mut self, value: Value) -> Self {
        self.initial = Some(value);
        self
    }
}
