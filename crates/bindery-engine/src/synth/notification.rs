//! Notification-contract resolution.
//!
//! Determines how the synthesized class sources its change-notification
//! channel: built from scratch, built into an abstract event slot the
//! prototype already declares, or routed through a raiser method the
//! prototype already implements. Nothing is guessed: a concrete channel
//! without a recognizable raiser is an error.

use bindery_model::{FunctionId, TypeTag, NOTIFY_EVENT, NOTIFY_INTERFACE, RAISER_NAMES};

use crate::error::{SynthError, SynthResult};
use crate::synth::analyzer::PrototypeDescriptor;

/// How the synthesized class sources its notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPlan {
    /// The prototype does not declare the channel; synthesize it whole
    Absent,
    /// The prototype declares the channel abstractly; synthesize the
    /// channel into the declared slot
    AbstractReimplement,
    /// The prototype implements the channel concretely; raise through its
    /// own raiser method
    ExternalMethod {
        /// The prototype's raiser body
        raiser: FunctionId,
    },
}

/// Resolve the notification contract for a descriptor.
pub fn resolve(descriptor: &PrototypeDescriptor) -> SynthResult<NotificationPlan> {
    if !descriptor.has_in_closure(NOTIFY_INTERFACE) {
        return Ok(NotificationPlan::Absent);
    }

    let concrete_event = descriptor
        .event(NOTIFY_EVENT)
        .is_some_and(|event| !event.def.is_abstract());
    if !concrete_event {
        return Ok(NotificationPlan::AbstractReimplement);
    }

    // The channel is concretely implemented: find the conventional raiser
    // (concrete, inheritable, one string parameter, void) and reuse it.
    let raiser = descriptor.methods().find_map(|view| {
        let def = &view.def;
        let conventional = RAISER_NAMES.contains(&def.name.as_str());
        let unary_string = def.params.len() == 1 && def.params[0].type_tag == TypeTag::Str;
        let void = def.return_type.is_none();
        let inheritable = def.modifiers.visibility.is_accessible_outside();
        if conventional && unary_string && void && inheritable {
            def.body
        } else {
            None
        }
    });

    match raiser {
        Some(raiser) => Ok(NotificationPlan::ExternalMethod { raiser }),
        None => Err(SynthError::MissingNotifierMethod {
            prototype: descriptor.name.clone(),
        }),
    }
}
