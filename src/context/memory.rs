//! In-memory context store.
//!
//! Keeps every entry in a map keyed by namespace, backend and key. Backends
//! are just names; the default backend is an alias for the configured
//! default name so that reads through `None` and through the explicit name
//! hit the same entry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use serde_json::Value;

use super::{ContextScope, ContextStore};

const UNNAMED_BACKEND: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EntryKey {
    namespace: String,
    backend: String,
    key: String,
}

/// Thread-safe in-memory [`ContextStore`].
#[derive(Debug, Default)]
pub struct MemoryContextStore {
    entries: RwLock<HashMap<EntryKey, Value>>,
    default_storage: Option<String>,
    writes: AtomicUsize,
}

impl MemoryContextStore {
    /// Create a store without a configured default backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose default backend is `name`.
    pub fn with_default_storage(name: impl Into<String>) -> Self {
        Self {
            default_storage: Some(name.into()),
            ..Self::default()
        }
    }

    /// Number of `set` calls served so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored entries across all namespaces and backends.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove an entry, as if it had never been written.
    pub fn remove(&self, scope: ContextScope<'_>, key: &str, storage: Option<&str>) -> Option<Value> {
        let entry = self.entry_key(scope, key, storage);
        self.entries
            .write()
            .ok()
            .and_then(|mut entries| entries.remove(&entry))
    }

    fn entry_key(&self, scope: ContextScope<'_>, key: &str, storage: Option<&str>) -> EntryKey {
        let namespace = match scope {
            ContextScope::Node(id) => format!("node:{}", id),
            ContextScope::Flow(id) => format!("flow:{}", id),
            ContextScope::Global => "global".to_string(),
        };
        let backend = storage
            .or(self.default_storage.as_deref())
            .unwrap_or(UNNAMED_BACKEND)
            .to_string();
        EntryKey {
            namespace,
            backend,
            key: key.to_string(),
        }
    }
}

impl ContextStore for MemoryContextStore {
    fn get(&self, scope: ContextScope<'_>, key: &str, storage: Option<&str>) -> Option<Value> {
        let entry = self.entry_key(scope, key, storage);
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(&entry).cloned())
    }

    fn set(&self, scope: ContextScope<'_>, key: &str, value: Value, storage: Option<&str>) {
        let entry = self.entry_key(scope, key, storage);
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(entry, value);
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn default_storage(&self) -> Option<String> {
        self.default_storage.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_missing_returns_none() {
        let store = MemoryContextStore::new();
        assert_eq!(store.get(ContextScope::Global, "missing", None), None);
    }

    #[test]
    fn test_set_and_get() {
        let store = MemoryContextStore::new();
        store.set(ContextScope::Global, "key", json!({"a": 1}), None);
        assert_eq!(store.get(ContextScope::Global, "key", None), Some(json!({"a": 1})));
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let store = MemoryContextStore::new();
        store.set(ContextScope::Node("n1"), "key", json!(1), None);
        store.set(ContextScope::Flow("f1"), "key", json!(2), None);
        store.set(ContextScope::Global, "key", json!(3), None);

        assert_eq!(store.get(ContextScope::Node("n1"), "key", None), Some(json!(1)));
        assert_eq!(store.get(ContextScope::Node("n2"), "key", None), None);
        assert_eq!(store.get(ContextScope::Flow("f1"), "key", None), Some(json!(2)));
        assert_eq!(store.get(ContextScope::Global, "key", None), Some(json!(3)));
    }

    #[test]
    fn test_backends_are_isolated() {
        let store = MemoryContextStore::new();
        store.set(ContextScope::Global, "key", json!("file"), Some("file"));
        assert_eq!(store.get(ContextScope::Global, "key", None), None);
        assert_eq!(store.get(ContextScope::Global, "key", Some("file")), Some(json!("file")));
    }

    #[test]
    fn test_default_backend_aliases_its_name() {
        let store = MemoryContextStore::with_default_storage("memory");
        store.set(ContextScope::Global, "key", json!(true), Some("memory"));
        assert_eq!(store.get(ContextScope::Global, "key", None), Some(json!(true)));
        assert_eq!(store.default_storage(), Some("memory".to_string()));
    }

    #[test]
    fn test_remove() {
        let store = MemoryContextStore::new();
        store.set(ContextScope::Global, "key", json!(1), None);
        assert_eq!(store.remove(ContextScope::Global, "key", None), Some(json!(1)));
        assert!(store.is_empty());
    }
}
