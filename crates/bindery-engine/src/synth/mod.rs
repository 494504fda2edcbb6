//! The type-synthesis pipeline.
//!
//! Analyzer → Classifier → ContractResolver → Emitter, wrapped by the
//! cache's build-once-per-key discipline:
//!
//! - [`analyzer::analyze`] closes and validates the prototype surface
//! - [`classifier::classify`] assigns each member a synthesis plan
//! - [`notification::resolve`] sources the notification channel
//! - [`emitter::emit`] materializes the plans into a [`SynthesizedClass`]
//! - [`cache::TypeCache`] guarantees one build per (prototype, selector)

pub mod analyzer;
pub mod cache;
pub mod class;
pub mod classifier;
pub mod emitter;
pub mod notification;

pub use analyzer::{analyze, MemberView, MethodView, PropertyView, PrototypeDescriptor};
pub use cache::{TypeCache, TypeKey};
pub use class::{
    ConstructorSlot, EventSlot, MethodSlot, MethodSlotKind, PropertySlot, PropertySlotKind,
    SynthesizedClass,
};
pub use classifier::{classify, Classification, MemberPlan, Selector};
pub use emitter::emit;
pub use notification::{resolve, NotificationPlan};
