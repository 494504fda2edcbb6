//! Synthesized instances.
//!
//! An [`Instance`] is a field vector interpreted against a
//! [`SynthesizedClass`], plus the notification channel. Member behavior
//! registered by the prototype runs against a [`NativeCtx`], which grants
//! field access, virtual property dispatch, and notification raising.
//!
//! Notifications queued while the field lock is held are delivered after it
//! is released, so a handler may freely re-enter the instance.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use bindery_model::{FunctionId, ParamDef, Value, NOTIFY_EVENT};

use crate::error::{RuntimeError, RuntimeResult};
use crate::registry::FunctionRegistry;
use crate::runtime::channel::{ChangeChannel, ChangeHandler, SubscriptionId};
use crate::synth::class::{EventSlot, MethodSlotKind, PropertySlotKind, SynthesizedClass};
use crate::synth::notification::NotificationPlan;

/// Field values of one instance.
#[derive(Debug)]
pub struct FieldStore {
    values: Vec<Value>,
}

impl FieldStore {
    /// Create a store from the class's initial field values
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Get a field value by index
    pub fn get(&self, index: usize) -> RuntimeResult<Value> {
        self.values
            .get(index)
            .cloned()
            .ok_or(RuntimeError::FieldOutOfBounds {
                index,
                len: self.values.len(),
            })
    }

    /// Set a field value by index
    pub fn set(&mut self, index: usize, value: Value) -> RuntimeResult<()> {
        let len = self.values.len();
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RuntimeError::FieldOutOfBounds { index, len }),
        }
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store has no fields
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Execution context handed to registered member behavior.
pub struct NativeCtx<'a> {
    class: &'a SynthesizedClass,
    fields: &'a mut FieldStore,
    functions: &'a FunctionRegistry,
    pending: Vec<String>,
}

impl<'a> NativeCtx<'a> {
    /// The class the call runs against
    pub fn class(&self) -> &SynthesizedClass {
        self.class
    }

    /// Read a field by index
    pub fn get_field(&self, index: usize) -> RuntimeResult<Value> {
        self.fields.get(index)
    }

    /// Write a field by index, without notification
    pub fn set_field(&mut self, index: usize, value: Value) -> RuntimeResult<()> {
        self.fields.set(index, value)
    }

    /// Queue a change notification for delivery once the current member
    /// call completes
    pub fn raise(&mut self, property: &str) {
        self.pending.push(property.to_string());
    }

    /// Invoke a registered function against this context
    pub fn call(&mut self, id: FunctionId, args: &[Value]) -> RuntimeResult<Value> {
        let function = self
            .functions
            .get(id)
            .ok_or(RuntimeError::UnknownFunction { id: id.0 })?;
        function(self, args)
    }

    /// Read a property through its slot, dispatching to registered bodies
    /// where the slot requires it
    pub fn get_property(&mut self, name: &str) -> RuntimeResult<Value> {
        let class = self.class;
        let slot = class
            .property(name)
            .ok_or_else(|| self.unknown_member(name))?;
        match &slot.kind {
            PropertySlotKind::Bindable { field, .. }
            | PropertySlotKind::PassThrough { field } => self.get_field(*field),
            PropertySlotKind::Stub => Err(RuntimeError::NotImplemented {
                member: name.to_string(),
            }),
            PropertySlotKind::Dispatch {
                getter: Some(getter),
                ..
            } => self.call(*getter, &[]),
            PropertySlotKind::Dispatch { getter: None, .. } => Err(self.unknown_member(name)),
        }
    }

    /// Write a property through its slot. A bindable slot stores only on an
    /// effective change and queues the property's own name followed by each
    /// related name, in declaration order.
    pub fn set_property(&mut self, name: &str, value: Value) -> RuntimeResult<()> {
        let class = self.class;
        let slot = class
            .property(name)
            .ok_or_else(|| self.unknown_member(name))?;
        if slot.read_only {
            return Err(RuntimeError::ReadOnlyProperty {
                property: name.to_string(),
            });
        }
        let got = value.type_name();
        let value = slot
            .value_type
            .coerce(value)
            .ok_or_else(|| RuntimeError::TypeMismatch {
                expected: slot.value_type.name().to_string(),
                got: got.to_string(),
            })?;

        match &slot.kind {
            PropertySlotKind::Bindable { field, related } => {
                let current = self.get_field(*field)?;
                if current == value {
                    return Ok(());
                }
                self.set_field(*field, value)?;
                self.queue_change(name)?;
                for dependent in related {
                    self.queue_change(dependent)?;
                }
                Ok(())
            }
            PropertySlotKind::PassThrough { field } => self.set_field(*field, value),
            PropertySlotKind::Stub => Err(RuntimeError::NotImplemented {
                member: name.to_string(),
            }),
            PropertySlotKind::Dispatch {
                setter: Some(setter),
                ..
            } => {
                self.call(*setter, &[value])?;
                Ok(())
            }
            PropertySlotKind::Dispatch { setter: None, .. } => {
                Err(RuntimeError::ReadOnlyProperty {
                    property: name.to_string(),
                })
            }
        }
    }

    /// Route one change notification according to the class's notification
    /// plan: through the prototype's raiser when one was resolved,
    /// otherwise onto the synthesized channel's queue.
    fn queue_change(&mut self, property: &str) -> RuntimeResult<()> {
        match self.class.notification {
            NotificationPlan::ExternalMethod { raiser } => {
                self.call(raiser, &[Value::str(property)])?;
                Ok(())
            }
            _ => {
                self.pending.push(property.to_string());
                Ok(())
            }
        }
    }

    fn unknown_member(&self, member: &str) -> RuntimeError {
        RuntimeError::UnknownMember {
            class: self.class.name.clone(),
            member: member.to_string(),
        }
    }
}

/// An instance of a synthesized class.
pub struct Instance {
    class: Arc<SynthesizedClass>,
    functions: Arc<FunctionRegistry>,
    fields: RwLock<FieldStore>,
    channel: ChangeChannel,
    event_channels: FxHashMap<String, ChangeChannel>,
}

impl Instance {
    /// Allocate an instance with the class's initial field values
    pub(crate) fn new(class: Arc<SynthesizedClass>, functions: Arc<FunctionRegistry>) -> Self {
        let fields = RwLock::new(FieldStore::new(class.field_defaults.clone()));
        let event_channels = class
            .events
            .iter()
            .filter(|(name, slot)| **slot == EventSlot::Channel && name.as_str() != NOTIFY_EVENT)
            .map(|(name, _)| (name.clone(), ChangeChannel::new()))
            .collect();
        Self {
            class,
            functions,
            fields,
            channel: ChangeChannel::new(),
            event_channels,
        }
    }

    /// The synthesized class of this instance
    pub fn class(&self) -> &Arc<SynthesizedClass> {
        &self.class
    }

    /// Run a member call under the field lock, then deliver any queued
    /// notifications after the lock is released.
    fn with_ctx<R>(
        &self,
        f: impl FnOnce(&mut NativeCtx<'_>) -> RuntimeResult<R>,
    ) -> RuntimeResult<R> {
        let (result, pending) = {
            let mut guard = self.fields.write();
            let mut ctx = NativeCtx {
                class: self.class.as_ref(),
                fields: &mut guard,
                functions: self.functions.as_ref(),
                pending: Vec::new(),
            };
            let result = f(&mut ctx);
            (result, ctx.pending)
        };
        for property in &pending {
            self.channel.raise(property);
        }
        result
    }

    /// Read a simple property
    pub fn get(&self, property: &str) -> RuntimeResult<Value> {
        self.with_ctx(|ctx| ctx.get_property(property))
    }

    /// Write a simple property
    pub fn set(&self, property: &str, value: Value) -> RuntimeResult<()> {
        self.with_ctx(|ctx| ctx.set_property(property, value))
    }

    /// Read an indexed property
    pub fn get_index(&self, property: &str, index: &[Value]) -> RuntimeResult<Value> {
        self.with_ctx(|ctx| {
            let slot = ctx
                .class
                .property(property)
                .ok_or_else(|| ctx.unknown_member(property))?;
            match &slot.kind {
                PropertySlotKind::Stub => Err(RuntimeError::NotImplemented {
                    member: property.to_string(),
                }),
                PropertySlotKind::Dispatch {
                    getter: Some(getter),
                    ..
                } => ctx.call(*getter, index),
                _ => Err(ctx.unknown_member(property)),
            }
        })
    }

    /// Write an indexed property
    pub fn set_index(
        &self,
        property: &str,
        index: &[Value],
        value: Value,
    ) -> RuntimeResult<()> {
        self.with_ctx(|ctx| {
            let slot = ctx
                .class
                .property(property)
                .ok_or_else(|| ctx.unknown_member(property))?;
            match &slot.kind {
                PropertySlotKind::Stub => Err(RuntimeError::NotImplemented {
                    member: property.to_string(),
                }),
                PropertySlotKind::Dispatch {
                    setter: Some(setter),
                    ..
                } => {
                    let mut args: Vec<Value> = index.to_vec();
                    args.push(value);
                    ctx.call(*setter, &args)?;
                    Ok(())
                }
                _ => Err(ctx.unknown_member(property)),
            }
        })
    }

    /// Invoke a method by name and argument list
    pub fn invoke(&self, method: &str, args: &[Value]) -> RuntimeResult<Value> {
        let slot = self
            .class
            .find_method(method, args.len())
            .ok_or_else(|| RuntimeError::UnknownMember {
                class: self.class.name.clone(),
                member: method.to_string(),
            })?;
        match slot.kind {
            MethodSlotKind::Stub => Err(RuntimeError::NotImplemented {
                member: method.to_string(),
            }),
            MethodSlotKind::Dispatch(body) => {
                let coerced = coerce_args(&slot.params, args)?;
                self.with_ctx(|ctx| ctx.call(body, &coerced))
            }
        }
    }

    /// Subscribe to the change-notification channel
    pub fn subscribe(&self, handler: ChangeHandler) -> SubscriptionId {
        self.channel.subscribe(handler)
    }

    /// Unsubscribe from the change-notification channel
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.channel.unsubscribe(id)
    }

    /// Number of change-notification subscribers
    pub fn subscriber_count(&self) -> usize {
        self.channel.subscriber_count()
    }

    /// Subscribe to a declared event by name. The notification channel's
    /// event resolves to the channel itself; a stub event signals
    /// NotImplemented.
    pub fn subscribe_to(
        &self,
        event: &str,
        handler: ChangeHandler,
    ) -> RuntimeResult<SubscriptionId> {
        if event == NOTIFY_EVENT {
            return Ok(self.channel.subscribe(handler));
        }
        match self.class.event(event) {
            Some(EventSlot::Channel) => {
                let channel = self
                    .event_channels
                    .get(event)
                    .ok_or_else(|| self.unknown_member(event))?;
                Ok(channel.subscribe(handler))
            }
            Some(EventSlot::Stub) => Err(RuntimeError::NotImplemented {
                member: event.to_string(),
            }),
            None => Err(self.unknown_member(event)),
        }
    }

    /// Unsubscribe from a declared event by name
    pub fn unsubscribe_from(&self, event: &str, id: SubscriptionId) -> RuntimeResult<bool> {
        if event == NOTIFY_EVENT {
            return Ok(self.channel.unsubscribe(id));
        }
        match self.class.event(event) {
            Some(EventSlot::Channel) => {
                let channel = self
                    .event_channels
                    .get(event)
                    .ok_or_else(|| self.unknown_member(event))?;
                Ok(channel.unsubscribe(id))
            }
            Some(EventSlot::Stub) => Err(RuntimeError::NotImplemented {
                member: event.to_string(),
            }),
            None => Err(self.unknown_member(event)),
        }
    }

    /// Run a forwarding constructor's body
    pub(crate) fn run_constructor(&self, body: FunctionId, args: &[Value]) -> RuntimeResult<()> {
        self.with_ctx(|ctx| ctx.call(body, args).map(|_| ()))
    }

    fn unknown_member(&self, member: &str) -> RuntimeError {
        RuntimeError::UnknownMember {
            class: self.class.name.clone(),
            member: member.to_string(),
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("fields", &self.fields.read().len())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Coerce an argument list to the declared parameter types.
pub(crate) fn coerce_args(params: &[ParamDef], args: &[Value]) -> RuntimeResult<Vec<Value>> {
    params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            param
                .type_tag
                .coerce(arg.clone())
                .ok_or_else(|| RuntimeError::TypeMismatch {
                    expected: param.type_tag.name().to_string(),
                    got: arg.type_name().to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindery_model::TypeTag;

    #[test]
    fn test_field_store_bounds() {
        let mut store = FieldStore::new(vec![Value::I32(0), Value::Null]);
        assert_eq!(store.len(), 2);

        assert_eq!(store.get(0).unwrap(), Value::I32(0));
        store.set(1, Value::str("x")).unwrap();
        assert_eq!(store.get(1).unwrap(), Value::str("x"));

        assert!(matches!(
            store.get(2),
            Err(RuntimeError::FieldOutOfBounds { index: 2, len: 2 })
        ));
        assert!(store.set(5, Value::Null).is_err());
    }

    #[test]
    fn test_coerce_args_widens_and_rejects() {
        let params = vec![
            ParamDef::new("a", TypeTag::F64),
            ParamDef::new("b", TypeTag::Str),
        ];
        let coerced = coerce_args(&params, &[Value::I32(2), Value::str("x")]).unwrap();
        assert_eq!(coerced, vec![Value::F64(2.0), Value::str("x")]);

        let err = coerce_args(&params, &[Value::Bool(true), Value::str("x")]).unwrap_err();
        assert!(matches!(err, RuntimeError::TypeMismatch { .. }));
    }
}
