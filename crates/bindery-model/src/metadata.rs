//! Annotation storage for prototypes.
//!
//! Provides a store for attaching metadata to prototype types and to
//! specific properties on them, keyed by name (prototypes are named
//! descriptions, so names are stable identities). The engine consumes two
//! well-known annotations: the bindable tag read by the annotation-driven
//! selector, and related-property declarations merged into the synthesis
//! descriptor.

use rustc_hash::FxHashMap;

use crate::value::Value;

/// A metadata key - can be any string
pub type MetadataKey = String;

/// A property key - the name of a property on a prototype
pub type PropertyKey = String;

/// Annotation key marking a property as eligible for bindable synthesis
/// under the annotation-driven selector.
pub const BINDABLE_KEY: &str = "bindery:bindable";

/// Annotation key carrying a comma-separated list of related property names.
pub const RELATED_KEY: &str = "bindery:related";

/// Metadata attached to a single prototype
#[derive(Debug, Default)]
struct TargetMetadata {
    /// Direct metadata on the prototype (key -> value)
    direct: FxHashMap<MetadataKey, Value>,
    /// Property-level metadata (property -> key -> value)
    properties: FxHashMap<PropertyKey, FxHashMap<MetadataKey, Value>>,
}

/// Annotation store for prototype types and their properties.
#[derive(Debug, Default)]
pub struct MetadataStore {
    /// Map from prototype name to its metadata
    targets: FxHashMap<String, TargetMetadata>,
}

impl MetadataStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Direct (type-level) metadata operations
    // ========================================================================

    /// Define metadata on a prototype
    pub fn define(&mut self, target: &str, key: MetadataKey, value: Value) {
        let entry = self.targets.entry(target.to_string()).or_default();
        entry.direct.insert(key, value);
    }

    /// Get metadata from a prototype
    pub fn get(&self, target: &str, key: &str) -> Option<&Value> {
        self.targets.get(target)?.direct.get(key)
    }

    /// Check if a prototype has metadata under `key`
    pub fn has(&self, target: &str, key: &str) -> bool {
        self.targets
            .get(target)
            .is_some_and(|e| e.direct.contains_key(key))
    }

    /// Delete metadata from a prototype.
    /// Returns true if the metadata existed and was deleted.
    pub fn delete(&mut self, target: &str, key: &str) -> bool {
        self.targets
            .get_mut(target)
            .is_some_and(|e| e.direct.remove(key).is_some())
    }

    // ========================================================================
    // Property-level metadata operations
    // ========================================================================

    /// Define metadata on a property of a prototype
    pub fn define_property(
        &mut self,
        target: &str,
        property: &str,
        key: MetadataKey,
        value: Value,
    ) {
        let entry = self.targets.entry(target.to_string()).or_default();
        let prop_entry = entry.properties.entry(property.to_string()).or_default();
        prop_entry.insert(key, value);
    }

    /// Get metadata from a property of a prototype
    pub fn get_property(&self, target: &str, property: &str, key: &str) -> Option<&Value> {
        self.targets
            .get(target)?
            .properties
            .get(property)?
            .get(key)
    }

    /// Check if a property has metadata under `key`
    pub fn has_property(&self, target: &str, property: &str, key: &str) -> bool {
        self.targets.get(target).is_some_and(|e| {
            e.properties
                .get(property)
                .is_some_and(|p| p.contains_key(key))
        })
    }

    /// Delete metadata from a property.
    /// Returns true if the metadata existed and was deleted.
    pub fn delete_property(&mut self, target: &str, property: &str, key: &str) -> bool {
        self.targets.get_mut(target).is_some_and(|e| {
            e.properties
                .get_mut(property)
                .is_some_and(|p| p.remove(key).is_some())
        })
    }

    // ========================================================================
    // Well-known annotations
    // ========================================================================

    /// Tag a property as bindable for the annotation-driven selector
    pub fn tag_bindable(&mut self, target: &str, property: &str) {
        self.define_property(target, property, BINDABLE_KEY.to_string(), Value::Bool(true));
    }

    /// Whether a property carries the bindable tag
    pub fn is_bindable(&self, target: &str, property: &str) -> bool {
        matches!(
            self.get_property(target, property, BINDABLE_KEY),
            Some(Value::Bool(true))
        )
    }

    /// Declare related properties whose notification must also fire when
    /// `property` changes
    pub fn set_related(&mut self, target: &str, property: &str, related: &[&str]) {
        self.define_property(
            target,
            property,
            RELATED_KEY.to_string(),
            Value::str(related.join(",")),
        );
    }

    /// Related property names declared for `property`, in declaration order
    pub fn related(&self, target: &str, property: &str) -> Vec<String> {
        match self.get_property(target, property, RELATED_KEY) {
            Some(Value::Str(s)) if !s.is_empty() => {
                s.split(',').map(|n| n.trim().to_string()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Number of prototypes with metadata
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let mut store = MetadataStore::new();
        store.define("Rectangle", "key".to_string(), Value::I32(42));

        assert_eq!(store.get("Rectangle", "key"), Some(&Value::I32(42)));
        assert_eq!(store.get("Rectangle", "missing"), None);
        assert_eq!(store.get("Circle", "key"), None);
        assert!(store.has("Rectangle", "key"));
    }

    #[test]
    fn test_delete() {
        let mut store = MetadataStore::new();
        store.define("Rectangle", "key".to_string(), Value::Bool(true));

        assert!(store.delete("Rectangle", "key"));
        assert!(!store.has("Rectangle", "key"));
        assert!(!store.delete("Rectangle", "key"));
    }

    #[test]
    fn test_property_metadata() {
        let mut store = MetadataStore::new();
        store.define_property("Rectangle", "Length", "type".to_string(), Value::str("i32"));

        assert_eq!(
            store.get_property("Rectangle", "Length", "type"),
            Some(&Value::str("i32"))
        );
        assert_eq!(store.get_property("Rectangle", "Width", "type"), None);
        assert!(store.has_property("Rectangle", "Length", "type"));

        assert!(store.delete_property("Rectangle", "Length", "type"));
        assert!(!store.has_property("Rectangle", "Length", "type"));
    }

    #[test]
    fn test_bindable_tag() {
        let mut store = MetadataStore::new();
        assert!(!store.is_bindable("Rectangle", "Length"));

        store.tag_bindable("Rectangle", "Length");
        assert!(store.is_bindable("Rectangle", "Length"));
        assert!(!store.is_bindable("Rectangle", "Width"));
    }

    #[test]
    fn test_related_declarations() {
        let mut store = MetadataStore::new();
        assert!(store.related("Rectangle", "Length").is_empty());

        store.set_related("Rectangle", "Length", &["Size", "Perimeter"]);
        assert_eq!(
            store.related("Rectangle", "Length"),
            vec!["Size".to_string(), "Perimeter".to_string()]
        );
    }

    #[test]
    fn test_separate_targets() {
        let mut store = MetadataStore::new();
        store.define("A", "key".to_string(), Value::I32(1));
        store.define("B", "key".to_string(), Value::I32(2));

        assert_eq!(store.get("A", "key"), Some(&Value::I32(1)));
        assert_eq!(store.get("B", "key"), Some(&Value::I32(2)));
        assert_eq!(store.target_count(), 2);
    }
}
