//! Per-request context threaded through every resolver.
//!
//! A context is an ordered JSON object plus a set of typed extensions.
//! The JSON half is what gets merged and inspected by callers building a
//! request; extensions carry handles that have no JSON form (database
//! pools, loaders, clocks).

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Request context.
#[derive(Clone, Default)]
pub struct Context {
    values: Map<String, Value>,
    extensions: FxHashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Context {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Gets a value deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Sets a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Builder form of [`Context::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns the JSON entries.
    #[must_use]
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.extensions.is_empty()
    }

    /// Returns the JSON entries as an object value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Shallow merge: every top-level entry and extension of `other`
    /// overwrites the one of the same key in `self`.
    pub fn merge(&mut self, other: Context) {
        for (key, value) in other.values {
            self.values.insert(key, value);
        }
        self.extensions.extend(other.extensions);
    }

    /// Returns `self` merged with `other`.
    #[must_use]
    pub fn merged(mut self, other: Context) -> Self {
        self.merge(other);
        self
    }

    /// Stores a typed extension, replacing any previous one of that type.
    pub fn insert_extension<T: Any + Send + Sync>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Arc::new(value));
    }

    /// Builder form of [`Context::insert_extension`].
    #[must_use]
    pub fn with_extension<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.insert_extension(value);
        self
    }

    /// Gets a typed extension.
    #[must_use]
    pub fn extension<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    #[must_use]
    pub fn has_extension<T: Any + Send + Sync>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("values", &self.values)
            .field("extension_count", &self.extensions.len())
            .finish()
    }
}

impl PartialEq for Context {
    /// Compares JSON entries only; extensions have no equality.
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl From<Map<String, Value>> for Context {
    fn from(values: Map<String, Value>) -> Self {
        Self {
            values,
            extensions: FxHashMap::default(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<Map<_, _>>()
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Clock(u64);

    #[test]
    fn test_get_and_insert() {
        let mut ctx = Context::new().with("user", json!({"id": "1"}));
        assert_eq!(ctx.get("user"), Some(&json!({"id": "1"})));
        assert_eq!(ctx.insert("user", "2"), Some(json!({"id": "1"})));
        assert_eq!(ctx.get_as::<String>("user").as_deref(), Some("2"));
        assert!(ctx.remove("user").is_some());
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_merge_is_shallow_and_right_biased() {
        let base: Context = [("a", json!({"x": 1})), ("b", json!(1))].into_iter().collect();
        let other: Context = [("a", json!({"y": 2})), ("c", json!(3))].into_iter().collect();

        let merged = base.merged(other);
        assert_eq!(
            merged.to_value(),
            json!({"a": {"y": 2}, "b": 1, "c": 3})
        );
        let keys: Vec<_> = merged.values().keys().cloned().collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn test_extensions() {
        let ctx = Context::new().with_extension(Clock(7));
        assert!(ctx.has_extension::<Clock>());
        assert_eq!(ctx.extension::<Clock>(), Some(&Clock(7)));
        assert_eq!(ctx.extension::<String>(), None);

        let merged = Context::new().merged(ctx.clone());
        assert_eq!(merged.extension::<Clock>(), Some(&Clock(7)));
        assert!(!ctx.is_empty());
    }
}
