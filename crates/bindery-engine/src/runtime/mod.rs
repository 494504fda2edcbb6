//! The bindable runtime: instances, the notification channel, and the
//! instance factory.

pub mod channel;
pub mod factory;
pub mod instance;

pub use channel::{ChangeChannel, ChangeHandler, SubscriptionId};
pub use factory::instantiate;
pub use instance::{FieldStore, Instance, NativeCtx};
