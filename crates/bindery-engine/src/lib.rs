//! Bindery synthesis engine.
//!
//! Synthesizes change-notifying concrete classes from prototype type
//! descriptions. The [`Engine`] wires the prototype and function
//! registries, the annotation store, and the build-once type cache around
//! the synthesis pipeline; synthesized classes are instantiated through
//! constructor-overload resolution and observed through the per-instance
//! notification channel.
//!
//! # Example
//!
//! ```ignore
//! use bindery_engine::Engine;
//! use bindery_model::{PropertyDef, PrototypeDef, TypeTag, Value};
//!
//! let engine = Engine::new();
//! engine.register_prototype(
//!     PrototypeDef::interface("Person")
//!         .with_property(PropertyDef::new("Name", TypeTag::Str)),
//! );
//!
//! let class = engine.build("Person")?;
//! let person = engine.instantiate(&class, &[])?;
//! person.subscribe(std::sync::Arc::new(|prop| println!("{prop} changed")));
//! person.set("Name", Value::str("Ada"))?;
//! ```

mod error;
mod registry;
pub mod runtime;
pub mod synth;

use std::sync::Arc;

use parking_lot::{RwLock, RwLockWriteGuard};
use tracing::debug;

use bindery_model::{notifying_interface, MetadataStore, PrototypeDef, Value};

pub use bindery_model::FunctionId;

pub use error::{RuntimeError, RuntimeResult, SynthError, SynthResult};
pub use registry::{FunctionRegistry, NativeFn, PrototypeRegistry};
pub use runtime::{ChangeHandler, Instance, NativeCtx, SubscriptionId};
pub use synth::{Classification, NotificationPlan, Selector, SynthesizedClass, TypeKey};

use synth::{analyze, classify, emit, resolve, TypeCache};

/// The synthesis engine facade.
///
/// Holds the prototype registry, the native-function registry, the
/// annotation store, and the memoized type cache. All operations take
/// `&self`; the engine is shared freely across threads.
#[derive(Debug)]
pub struct Engine {
    prototypes: PrototypeRegistry,
    functions: Arc<FunctionRegistry>,
    metadata: RwLock<MetadataStore>,
    cache: TypeCache,
}

impl Engine {
    /// Create an engine with the built-in notification interface
    /// registered.
    pub fn new() -> Self {
        let engine = Self {
            prototypes: PrototypeRegistry::new(),
            functions: Arc::new(FunctionRegistry::new()),
            metadata: RwLock::new(MetadataStore::new()),
            cache: TypeCache::new(),
        };
        engine.prototypes.register(notifying_interface());
        engine
    }

    /// Register a prototype definition, replacing any previous definition
    /// under the same name. Classes already built from the old definition
    /// stay cached; only failed keys rebuild.
    pub fn register_prototype(&self, def: PrototypeDef) {
        self.prototypes.register(def);
    }

    /// Register member behavior and return its handle
    pub fn register_function<F>(&self, f: F) -> FunctionId
    where
        F: Fn(&mut NativeCtx<'_>, &[Value]) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        self.functions.register(f)
    }

    /// Mutable access to the annotation store
    pub fn metadata(&self) -> RwLockWriteGuard<'_, MetadataStore> {
        self.metadata.write()
    }

    /// Build the synthesized class for a prototype under the default
    /// selection (every overridable, non-indexed, writable property).
    pub fn build(&self, prototype: &str) -> SynthResult<Arc<SynthesizedClass>> {
        self.build_with(prototype, &Selector::all())
    }

    /// Build the synthesized class for a prototype under a selector.
    ///
    /// Memoized on (prototype identity, selector identity): concurrent
    /// callers for one key observe exactly one pipeline run and the
    /// identical class. A failed build is not cached.
    pub fn build_with(
        &self,
        prototype: &str,
        selector: &Selector,
    ) -> SynthResult<Arc<SynthesizedClass>> {
        let key = TypeKey::new(prototype, selector.id());
        self.cache.get_or_build(&key, || {
            debug!(prototype, selector = selector.id(), "running synthesis pipeline");
            let metadata = self.metadata.read();
            let descriptor = analyze(&self.prototypes, &metadata, prototype)?;
            drop(metadata);
            let plan = classify(&descriptor, selector)?;
            let notification = resolve(&descriptor)?;
            Ok(Arc::new(emit(&descriptor, &plan, notification, selector.id())))
        })
    }

    /// Create an instance of a synthesized class
    pub fn instantiate(
        &self,
        class: &Arc<SynthesizedClass>,
        args: &[Value],
    ) -> RuntimeResult<Arc<Instance>> {
        runtime::instantiate(class, &self.functions, args)
    }

    /// Build under the default selection and instantiate in one step
    pub fn create(&self, prototype: &str, args: &[Value]) -> Result<Arc<Instance>, EngineError> {
        let class = self.build(prototype)?;
        Ok(self.instantiate(&class, args)?)
    }

    /// Whether a built class is cached for (prototype, selector id)
    pub fn is_cached(&self, prototype: &str, selector_id: &str) -> bool {
        self.cache.contains_built(&TypeKey::new(prototype, selector_id))
    }

    /// Number of built classes in the cache
    pub fn cached_count(&self) -> usize {
        self.cache.built_len()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Either phase of [`Engine::create`] can fail: synthesis or instantiation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Build-time failure
    #[error(transparent)]
    Synth(#[from] SynthError),
    /// Instantiation-time failure
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
