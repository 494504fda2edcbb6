//! The synthesized class record.
//!
//! A [`SynthesizedClass`] is the output of emission: a field layout plus
//! slot tables that instances are interpreted against. It persists for the
//! process lifetime once cached; the descriptors and plans that produced it
//! are discarded.

use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;

use bindery_model::{FunctionId, ParamDef, Signature, TypeTag, Value, Visibility};

use crate::synth::classifier::Classification;
use crate::synth::notification::NotificationPlan;

/// Global counter for generating unique class IDs
static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique class ID
pub(crate) fn generate_class_id() -> u64 {
    NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed)
}

/// How a property behaves on the synthesized class.
#[derive(Debug, Clone)]
pub enum PropertySlotKind {
    /// Backing field with change notification on effective writes
    Bindable {
        /// Backing field index
        field: usize,
        /// Dependent property names notified after the property's own name
        related: Vec<String>,
    },
    /// Backing field without notification
    PassThrough {
        /// Backing field index
        field: usize,
    },
    /// Accessors signal NotImplemented
    Stub,
    /// Accessors dispatch to the prototype's registered bodies
    Dispatch {
        /// Getter body
        getter: Option<FunctionId>,
        /// Setter body
        setter: Option<FunctionId>,
    },
}

/// A property slot on the synthesized class.
#[derive(Debug, Clone)]
pub struct PropertySlot {
    /// Declared value type
    pub value_type: TypeTag,
    /// Whether the property takes index parameters
    pub indexed: bool,
    /// Whether writes are rejected
    pub read_only: bool,
    /// Slot behavior
    pub kind: PropertySlotKind,
}

/// How a method behaves on the synthesized class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodSlotKind {
    /// Body signals NotImplemented
    Stub,
    /// Dispatches to the prototype's registered body
    Dispatch(FunctionId),
}

/// A method slot on the synthesized class.
#[derive(Debug, Clone)]
pub struct MethodSlot {
    /// Parameter declarations
    pub params: Vec<ParamDef>,
    /// Slot behavior
    pub kind: MethodSlotKind,
}

/// An event slot on the synthesized class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSlot {
    /// Subscription signals NotImplemented
    Stub,
    /// Working subscribe/unsubscribe backed by a per-instance channel
    Channel,
}

/// A forwarding constructor on the synthesized class: identical parameter
/// signature, passing all arguments through to the prototype's body.
#[derive(Debug, Clone)]
pub struct ConstructorSlot {
    /// Parameter declarations
    pub params: Vec<ParamDef>,
    /// Forwarded visibility
    pub visibility: Visibility,
    /// Prototype initialization body; `None` leaves fields at defaults
    pub body: Option<FunctionId>,
}

/// A concrete class synthesized from a prototype.
#[derive(Debug)]
pub struct SynthesizedClass {
    /// Unique class ID
    pub class_id: u64,
    /// Class name (prototype name with a `$Bindable` suffix)
    pub name: String,
    /// Name of the prototype this class was synthesized from
    pub prototype: String,
    /// Identity of the selector used for classification
    pub selector_id: String,
    /// Field names in slot order
    pub field_names: Vec<String>,
    /// Initial field values in slot order
    pub field_defaults: Vec<Value>,
    /// Property slots by name
    pub properties: FxHashMap<String, PropertySlot>,
    /// Method slots by signature
    pub methods: FxHashMap<Signature, MethodSlot>,
    /// Event slots by name
    pub events: FxHashMap<String, EventSlot>,
    /// Forwarding constructors
    pub constructors: Vec<ConstructorSlot>,
    /// How the notification channel is sourced
    pub notification: NotificationPlan,
}

impl SynthesizedClass {
    /// Number of instance fields
    pub fn field_count(&self) -> usize {
        self.field_defaults.len()
    }

    /// Look up a property slot by name
    pub fn property(&self, name: &str) -> Option<&PropertySlot> {
        self.properties.get(name)
    }

    /// Look up a method slot by name and arity
    pub fn find_method(&self, name: &str, arity: usize) -> Option<&MethodSlot> {
        self.methods
            .iter()
            .find(|(sig, _)| sig.name == name && sig.params.len() == arity)
            .map(|(_, slot)| slot)
    }

    /// Look up an event slot by name
    pub fn event(&self, name: &str) -> Option<EventSlot> {
        self.events.get(name).copied()
    }

    /// The classification a property slot was emitted under
    pub fn classification_of(&self, property: &str) -> Option<Classification> {
        self.properties.get(property).map(|slot| match slot.kind {
            PropertySlotKind::Bindable { .. } => Classification::Bindable,
            PropertySlotKind::PassThrough { .. } => Classification::PassThrough,
            PropertySlotKind::Stub => Classification::Stub,
            PropertySlotKind::Dispatch { .. } => Classification::Untouched,
        })
    }

    /// Whether this class was synthesized from the named prototype
    pub fn is_synthesized_from(&self, prototype: &str) -> bool {
        self.prototype == prototype
    }

    /// Names of all property slots
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(|name| name.as_str())
    }
}
