//! Member classification.
//!
//! Assigns every member of a prototype descriptor a synthesis plan. A
//! [`Selector`] narrows which writable properties become Bindable; with no
//! filter, every overridable, non-indexed, writable property is selected.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use bindery_model::{Signature, NOTIFY_EVENT};

use crate::error::SynthResult;
use crate::synth::analyzer::{MemberView, PropertyView, PrototypeDescriptor};

/// Synthesis plan for one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Backing storage plus change-notifying accessors
    Bindable,
    /// Backing storage without notification
    PassThrough,
    /// Generated body that signals NotImplemented when invoked
    Stub,
    /// Inherited as-is from the prototype
    Untouched,
}

/// Predicate selecting which properties become Bindable.
///
/// The id is half of the memoization key: two selectors with the same id
/// are treated as the same classification and resolve to the same cached
/// class.
#[derive(Clone)]
pub struct Selector {
    id: String,
    filter: Option<Arc<dyn Fn(&PropertyView) -> bool + Send + Sync>>,
}

impl Selector {
    /// Default selection: every overridable, non-indexed, writable property
    pub fn all() -> Self {
        Self {
            id: "default".to_string(),
            filter: None,
        }
    }

    /// Annotation-driven selection: properties carrying the bindable tag
    pub fn annotated() -> Self {
        Self::new("annotated", |view: &PropertyView| view.bindable_tag)
    }

    /// Custom selection under the given identity
    pub fn new<F>(id: &str, filter: F) -> Self
    where
        F: Fn(&PropertyView) -> bool + Send + Sync + 'static,
    {
        Self {
            id: id.to_string(),
            filter: Some(Arc::new(filter)),
        }
    }

    /// Selector identity used in the memoization key
    pub fn id(&self) -> &str {
        &self.id
    }

    /// `None` when no filter was supplied, otherwise the filter's verdict
    fn selects(&self, view: &PropertyView) -> Option<bool> {
        self.filter.as_ref().map(|f| f(view))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("id", &self.id)
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

/// Mapping from member identity to classification.
#[derive(Debug, Default)]
pub struct MemberPlan {
    entries: FxHashMap<Signature, Classification>,
}

impl MemberPlan {
    /// Classification of a member, if planned
    pub fn get(&self, signature: &Signature) -> Option<Classification> {
        self.entries.get(signature).copied()
    }

    /// Number of planned members
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the plan is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate the plan entries
    pub fn iter(&self) -> impl Iterator<Item = (&Signature, Classification)> {
        self.entries.iter().map(|(sig, c)| (sig, *c))
    }

    /// Whether every abstract member of the descriptor has a non-Untouched
    /// entry and no indexed property is Bindable. The generated class would
    /// be incomplete otherwise.
    pub fn is_complete(&self, descriptor: &PrototypeDescriptor) -> bool {
        descriptor.members.iter().all(|member| {
            if matches!(member, MemberView::Event(v) if v.def.name == NOTIFY_EVENT) {
                return true;
            }
            let signature = member.signature();
            let abstract_member = match member {
                MemberView::Property(v) => v.def.is_abstract(),
                MemberView::Method(v) => v.def.is_abstract(),
                MemberView::Event(v) => v.def.is_abstract(),
            };
            match self.get(&signature) {
                Some(Classification::Untouched) | None => !abstract_member,
                Some(Classification::Bindable) => {
                    if let MemberView::Property(v) = member {
                        !v.def.is_indexed()
                    } else {
                        false
                    }
                }
                Some(_) => true,
            }
        })
    }
}

/// Classify every member of the descriptor under the selector.
pub fn classify(descriptor: &PrototypeDescriptor, selector: &Selector) -> SynthResult<MemberPlan> {
    let mut entries = FxHashMap::default();

    for member in &descriptor.members {
        let signature = member.signature();
        let classification = match member {
            MemberView::Property(view) => classify_property(view, selector),
            MemberView::Method(view) => {
                if !view.def.modifiers.is_overridable() {
                    Classification::Untouched
                } else if view.def.is_abstract() {
                    Classification::Stub
                } else {
                    Classification::Untouched
                }
            }
            MemberView::Event(view) => {
                // The notification channel is owned by the contract
                // resolver, not the member plan.
                if view.def.name == NOTIFY_EVENT {
                    continue;
                }
                if view.def.is_abstract() {
                    Classification::Stub
                } else {
                    Classification::Untouched
                }
            }
        };
        entries.insert(signature, classification);
    }

    Ok(MemberPlan { entries })
}

fn classify_property(view: &PropertyView, selector: &Selector) -> Classification {
    let def = &view.def;

    // Non-overridable members are never touched.
    if !def.is_fully_overridable() {
        return Classification::Untouched;
    }

    // No automatic binding scheme exists for index-keyed values.
    if def.is_indexed() {
        return if def.is_abstract() {
            Classification::Stub
        } else {
            Classification::Untouched
        };
    }

    // A get-only property has nothing to compare-and-store on: a concrete
    // one keeps its computed body, an abstract one gets plain backing.
    if !def.has_setter() {
        return if def.is_abstract() {
            Classification::PassThrough
        } else {
            Classification::Untouched
        };
    }

    match selector.selects(view) {
        None | Some(true) => Classification::Bindable,
        Some(false) if def.is_abstract() => Classification::PassThrough,
        Some(false) => Classification::Untouched,
    }
}
