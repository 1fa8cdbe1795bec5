//! Context store interface and the accessor-side adapter.
//!
//! The context store itself belongs to the host runtime. This module only
//! defines the calls the accessor needs ([`ContextStore`]), an adapter that
//! maps a declaration's scope and storage onto those calls
//! ([`ContextAccess`]), and an in-memory store for hosts without one.

pub mod access;
pub mod memory;

pub use access::ContextAccess;
pub use memory::MemoryContextStore;

use serde_json::Value;

/// Resolved namespace of a context entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextScope<'a> {
    /// Private to one node, identified by node ID.
    Node(&'a str),
    /// Shared by all nodes of one flow, identified by flow ID.
    Flow(&'a str),
    /// Shared by everything.
    Global,
}

/// Host-provided key/value context store.
///
/// `storage` selects a named backend; `None` means the host's default
/// backend. Calls are synchronous and assumed reliable.
pub trait ContextStore: Send + Sync {
    /// Read a value. `None` if the key has never been written.
    fn get(&self, scope: ContextScope<'_>, key: &str, storage: Option<&str>) -> Option<Value>;

    /// Write a value.
    fn set(&self, scope: ContextScope<'_>, key: &str, value: Value, storage: Option<&str>);

    /// Name of the backend used when no storage is named, if the host has
    /// one configured.
    fn default_storage(&self) -> Option<String> {
        None
    }
}
