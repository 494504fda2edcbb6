//! Prototype and native-function registries.
//!
//! Prototypes are registered by name; member behavior is registered as
//! native functions and referenced by [`FunctionId`] from member
//! definitions. After registration, dispatch is an indexed lookup.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;

use bindery_model::{FunctionId, PrototypeDef, Value};

use crate::error::RuntimeResult;
use crate::runtime::NativeCtx;

/// A registered native function carrying member behavior.
///
/// The context grants field access, virtual property dispatch, and
/// notification raising against the instance the call runs on.
pub type NativeFn =
    Arc<dyn Fn(&mut NativeCtx<'_>, &[Value]) -> RuntimeResult<Value> + Send + Sync>;

/// Registry of native functions, indexed by [`FunctionId`].
#[derive(Default)]
pub struct FunctionRegistry {
    functions: RwLock<Vec<NativeFn>>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("count", &self.len())
            .finish()
    }
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function and return its handle
    pub fn register<F>(&self, f: F) -> FunctionId
    where
        F: Fn(&mut NativeCtx<'_>, &[Value]) -> RuntimeResult<Value> + Send + Sync + 'static,
    {
        let mut functions = self.functions.write();
        let id = FunctionId(functions.len());
        functions.push(Arc::new(f));
        id
    }

    /// Resolve a handle to its function
    pub fn get(&self, id: FunctionId) -> Option<NativeFn> {
        self.functions.read().get(id.0).cloned()
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.read().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registry of prototype definitions, keyed by type name.
#[derive(Debug, Default)]
pub struct PrototypeRegistry {
    prototypes: DashMap<String, Arc<PrototypeDef>>,
}

impl PrototypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prototype definition, replacing any previous definition
    /// under the same name
    pub fn register(&self, def: PrototypeDef) -> Arc<PrototypeDef> {
        let def = Arc::new(def);
        self.prototypes.insert(def.name.clone(), def.clone());
        def
    }

    /// Look up a prototype by name
    pub fn get(&self, name: &str) -> Option<Arc<PrototypeDef>> {
        self.prototypes.get(name).map(|entry| entry.value().clone())
    }

    /// Whether a prototype is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.prototypes.contains_key(name)
    }

    /// Number of registered prototypes
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }
}
