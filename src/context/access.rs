//! Adapter between value declarations and the host context store.

use std::sync::Arc;

use serde_json::Value;

use super::{ContextScope, ContextStore};
use crate::error::EventError;
use crate::values::{Scope, STORAGE_DEFAULT};

/// Maps `(scope, storage, key)` of a declaration onto context store calls
/// for one accessor instance.
#[derive(Clone)]
pub struct ContextAccess {
    store: Arc<dyn ContextStore>,
    node_id: String,
    flow_id: String,
}

impl std::fmt::Debug for ContextAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextAccess")
            .field("node_id", &self.node_id)
            .field("flow_id", &self.flow_id)
            .finish_non_exhaustive()
    }
}

impl ContextAccess {
    /// Create an adapter for the node `node_id` living in flow `flow_id`.
    pub fn new(
        store: Arc<dyn ContextStore>,
        node_id: impl Into<String>,
        flow_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            node_id: node_id.into(),
            flow_id: flow_id.into(),
        }
    }

    /// Read the entry at `key`. `Ok(None)` if it has never been written.
    ///
    /// # Errors
    ///
    /// [`EventError::InvalidScope`] if `scope` is not `node`, `flow` or
    /// `global`; the store is not touched in that case.
    pub fn read(&self, scope: &Scope, storage: &str, key: &str) -> Result<Option<Value>, EventError> {
        let namespace = self.namespace(scope)?;
        Ok(self.store.get(namespace, key, backend(storage)))
    }

    /// Write `value` at `key`.
    ///
    /// # Errors
    ///
    /// Same as [`ContextAccess::read`].
    pub fn write(&self, scope: &Scope, storage: &str, key: &str, value: Value) -> Result<(), EventError> {
        let namespace = self.namespace(scope)?;
        self.store.set(namespace, key, value, backend(storage));
        Ok(())
    }

    /// Fail early for scopes the store cannot serve.
    pub fn check_scope(&self, scope: &Scope) -> Result<(), EventError> {
        self.namespace(scope).map(|_| ())
    }

    /// The host's default backend name, if configured.
    pub fn default_storage(&self) -> Option<String> {
        self.store.default_storage()
    }

    fn namespace(&self, scope: &Scope) -> Result<ContextScope<'_>, EventError> {
        match scope {
            Scope::Node => Ok(ContextScope::Node(&self.node_id)),
            Scope::Flow => Ok(ContextScope::Flow(&self.flow_id)),
            Scope::Global => Ok(ContextScope::Global),
            Scope::Other(raw) => Err(EventError::InvalidScope(raw.clone())),
        }
    }
}

/// Named backends are passed through; the default sentinel is not.
fn backend(storage: &str) -> Option<&str> {
    if storage == STORAGE_DEFAULT {
        None
    } else {
        Some(storage)
    }
}
