//! Member emission.
//!
//! Materializes a descriptor, member plan, and notification plan into a
//! [`SynthesizedClass`]. The inherited field layout of a class prototype is
//! preserved at the front of the field vector so registered bodies see
//! stable indices; backing fields for emitted storage are appended after.

use rustc_hash::FxHashMap;

use bindery_model::{ConstructorDef, Visibility, NOTIFY_EVENT};

use tracing::debug;

use crate::synth::analyzer::{MemberView, PrototypeDescriptor};
use crate::synth::class::{
    generate_class_id, ConstructorSlot, EventSlot, MethodSlot, MethodSlotKind, PropertySlot,
    PropertySlotKind, SynthesizedClass,
};
use crate::synth::classifier::{Classification, MemberPlan};
use crate::synth::notification::NotificationPlan;

/// Suffix appended to the prototype name to form the synthesized class name.
const CLASS_SUFFIX: &str = "$Bindable";

/// Emit a synthesized class from the classified descriptor.
pub fn emit(
    descriptor: &PrototypeDescriptor,
    plan: &MemberPlan,
    notification: NotificationPlan,
    selector_id: &str,
) -> SynthesizedClass {
    let mut field_names = Vec::new();
    let mut field_defaults = Vec::new();

    for field in &descriptor.base_fields {
        field_names.push(field.name.clone());
        field_defaults.push(
            field
                .initial
                .clone()
                .unwrap_or_else(|| field.type_tag.default_value()),
        );
    }

    let mut properties = FxHashMap::default();
    let mut methods = FxHashMap::default();
    let mut events = FxHashMap::default();

    for member in &descriptor.members {
        let signature = member.signature();
        match member {
            MemberView::Property(view) => {
                let classification = plan.get(&signature).unwrap_or(Classification::Untouched);
                let def = &view.def;
                let kind = match classification {
                    Classification::Bindable => {
                        let field = field_names.len();
                        field_names.push(def.name.clone());
                        field_defaults.push(def.value_type.default_value());
                        PropertySlotKind::Bindable {
                            field,
                            related: view.related.clone(),
                        }
                    }
                    Classification::PassThrough => {
                        let field = field_names.len();
                        field_names.push(def.name.clone());
                        field_defaults.push(def.value_type.default_value());
                        PropertySlotKind::PassThrough { field }
                    }
                    Classification::Stub => PropertySlotKind::Stub,
                    Classification::Untouched => PropertySlotKind::Dispatch {
                        getter: def.getter.as_ref().and_then(|a| a.body),
                        setter: def.setter.as_ref().and_then(|a| a.body),
                    },
                };
                properties.insert(
                    def.name.clone(),
                    PropertySlot {
                        value_type: def.value_type,
                        indexed: def.is_indexed(),
                        read_only: !def.has_setter(),
                        kind,
                    },
                );
            }
            MemberView::Method(view) => {
                let classification = plan.get(&signature).unwrap_or(Classification::Untouched);
                let kind = match (classification, view.def.body) {
                    (Classification::Stub, _) | (_, None) => MethodSlotKind::Stub,
                    (_, Some(body)) => MethodSlotKind::Dispatch(body),
                };
                methods.insert(
                    signature,
                    MethodSlot {
                        params: view.def.params.clone(),
                        kind,
                    },
                );
            }
            MemberView::Event(view) => {
                if view.def.name == NOTIFY_EVENT {
                    continue;
                }
                let slot = if view.def.is_abstract() {
                    EventSlot::Stub
                } else {
                    EventSlot::Channel
                };
                events.insert(view.def.name.clone(), slot);
            }
        }
    }

    // The channel event always exists on the synthesized class; that is
    // the retrofit.
    events.insert(NOTIFY_EVENT.to_string(), EventSlot::Channel);

    let constructors = if descriptor.constructors.is_empty() {
        // Interface prototypes forward nothing; synthesize a default
        // constructor.
        vec![ConstructorSlot {
            params: Vec::new(),
            visibility: Visibility::Public,
            body: None,
        }]
    } else {
        descriptor.constructors.iter().map(forward).collect()
    };

    let class = SynthesizedClass {
        class_id: generate_class_id(),
        name: format!("{}{}", descriptor.name, CLASS_SUFFIX),
        prototype: descriptor.name.clone(),
        selector_id: selector_id.to_string(),
        field_names,
        field_defaults,
        properties,
        methods,
        events,
        constructors,
        notification,
    };

    debug!(
        class = %class.name,
        class_id = class.class_id,
        fields = class.field_count(),
        properties = class.properties.len(),
        methods = class.methods.len(),
        "emitted synthesized class"
    );

    class
}

/// One forwarding constructor per prototype constructor: identical
/// parameter signature, arguments passed through unchanged.
fn forward(ctor: &ConstructorDef) -> ConstructorSlot {
    ConstructorSlot {
        params: ctor.params.clone(),
        visibility: ctor.visibility,
        body: ctor.body,
    }
}
