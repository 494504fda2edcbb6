//! Memoized, thread-safe type construction.
//!
//! One generated class per (prototype identity, selector identity) key.
//! Concurrent callers for the same key observe exactly one pipeline run and
//! the identical class value; a failed build is reported to its callers and
//! leaves no entry behind, so a later build under the same key runs afresh.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use crate::error::SynthResult;
use crate::synth::class::SynthesizedClass;

/// Memoization key: prototype identity plus selector identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeKey {
    /// Prototype name
    pub prototype: String,
    /// Selector identity
    pub selector: String,
}

impl TypeKey {
    /// Create a key
    pub fn new(prototype: &str, selector: &str) -> Self {
        Self {
            prototype: prototype.to_string(),
            selector: selector.to_string(),
        }
    }
}

/// Build-once cache of synthesized classes.
///
/// Each key owns a single-assignment cell inside a concurrent map; within a
/// key exactly one thread runs the build while the rest wait for its result.
#[derive(Debug, Default)]
pub struct TypeCache {
    cells: DashMap<TypeKey, Arc<OnceCell<Arc<SynthesizedClass>>>>,
}

impl TypeCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached class for `key`, running `build` exactly once if
    /// the key has not been built yet.
    pub fn get_or_build<F>(&self, key: &TypeKey, build: F) -> SynthResult<Arc<SynthesizedClass>>
    where
        F: FnOnce() -> SynthResult<Arc<SynthesizedClass>>,
    {
        let cell = {
            let entry = self.cells.entry(key.clone()).or_default();
            entry.value().clone()
            // The shard guard drops here; the build below must not run
            // under it.
        };

        let result = cell
            .get_or_try_init(|| {
                trace!(prototype = %key.prototype, selector = %key.selector, "building type");
                build()
            })
            .cloned();

        match result {
            Ok(class) => {
                // A concurrently failing caller may have dropped the entry
                // between our build and now; re-assert it so every later
                // caller observes this same class.
                self.cells.entry(key.clone()).or_insert_with(|| cell.clone());
                Ok(class)
            }
            Err(err) => {
                debug!(prototype = %key.prototype, selector = %key.selector, error = %err,
                       "build failed; not cached");
                self.cells.remove_if(key, |_, cell| cell.get().is_none());
                Err(err)
            }
        }
    }

    /// The cached class for `key`, if it has been built
    pub fn get(&self, key: &TypeKey) -> Option<Arc<SynthesizedClass>> {
        self.cells.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Whether a built class exists for `key`
    pub fn contains_built(&self, key: &TypeKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of built entries
    pub fn built_len(&self) -> usize {
        self.cells
            .iter()
            .filter(|entry| entry.value().get().is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    use rustc_hash::FxHashMap;

    use crate::error::SynthError;
    use crate::synth::class::generate_class_id;
    use crate::synth::notification::NotificationPlan;

    fn dummy_class(prototype: &str) -> Arc<SynthesizedClass> {
        Arc::new(SynthesizedClass {
            class_id: generate_class_id(),
            name: format!("{}$Bindable", prototype),
            prototype: prototype.to_string(),
            selector_id: "default".to_string(),
            field_names: vec![],
            field_defaults: vec![],
            properties: FxHashMap::default(),
            methods: FxHashMap::default(),
            events: FxHashMap::default(),
            constructors: vec![],
            notification: NotificationPlan::Absent,
        })
    }

    #[test]
    fn test_build_runs_once_per_key() {
        let cache = TypeCache::new();
        let key = TypeKey::new("Rect", "default");
        let builds = AtomicUsize::new(0);

        let first = cache
            .get_or_build(&key, || {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(dummy_class("Rect"))
            })
            .unwrap();
        let second = cache
            .get_or_build(&key, || {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(dummy_class("Rect"))
            })
            .unwrap();

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.contains_built(&key));
    }

    #[test]
    fn test_distinct_keys_build_independently() {
        let cache = TypeCache::new();
        let a = cache
            .get_or_build(&TypeKey::new("Rect", "default"), || Ok(dummy_class("Rect")))
            .unwrap();
        let b = cache
            .get_or_build(&TypeKey::new("Rect", "annotated"), || {
                Ok(dummy_class("Rect"))
            })
            .unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.built_len(), 2);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let cache = TypeCache::new();
        let key = TypeKey::new("Broken", "default");

        let err = cache
            .get_or_build(&key, || {
                Err(SynthError::InvalidPrototype {
                    prototype: "Broken".to_string(),
                    reason: "sealed".to_string(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, SynthError::InvalidPrototype { .. }));
        assert!(!cache.contains_built(&key));
        assert_eq!(cache.built_len(), 0);

        // A retry under the same key runs a fresh build.
        let builds = AtomicUsize::new(0);
        let class = cache
            .get_or_build(&key, || {
                builds.fetch_add(1, Ordering::SeqCst);
                Ok(dummy_class("Broken"))
            })
            .unwrap();
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(class.is_synthesized_from("Broken"));
    }

    #[test]
    fn test_concurrent_builds_share_one_class() {
        const THREADS: usize = 32;

        let cache = TypeCache::new();
        let key = TypeKey::new("Rect", "default");
        let builds = AtomicUsize::new(0);
        let barrier = Barrier::new(THREADS);

        let classes: Vec<Arc<SynthesizedClass>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        cache
                            .get_or_build(&key, || {
                                builds.fetch_add(1, Ordering::SeqCst);
                                Ok(dummy_class("Rect"))
                            })
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(builds.load(Ordering::SeqCst), 1);
        for class in &classes {
            assert!(Arc::ptr_eq(class, &classes[0]));
        }
    }
}
