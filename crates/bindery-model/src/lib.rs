//! Bindery prototype description model.
//!
//! This crate provides the data types the synthesis engine consumes,
//! without depending on the engine itself: tagged values, member and
//! prototype definitions, and the annotation store.
//!
//! # Example
//!
//! ```ignore
//! use bindery_model::{PrototypeDef, PropertyDef, TypeTag};
//!
//! let shape = PrototypeDef::interface("Shape")
//!     .with_property(PropertyDef::new("Area", TypeTag::F64).read_only());
//! ```

#![warn(missing_docs)]

mod member;
mod metadata;
mod prototype;
mod value;

pub use member::{
    AccessorDef, ConstructorDef, EventDef, FieldDef, FunctionId, MemberKind, MethodDef, Modifiers,
    ParamDef, PropertyDef, Signature, Visibility,
};
pub use metadata::{MetadataKey, MetadataStore, PropertyKey, BINDABLE_KEY, RELATED_KEY};
pub use prototype::{
    notifying_interface, PrototypeDef, PrototypeKind, NOTIFY_EVENT, NOTIFY_INTERFACE, RAISER_NAMES,
};
pub use value::{TypeTag, Value};
