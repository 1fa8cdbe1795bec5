//! # Persistent Values
//!
//! Typed access to named values kept in a host's scoped key/value context
//! store.
//!
//! Values are declared in shared registries ([`ValueRegistry`]): each
//! declaration has a datatype, a default, a scope (`node`, `flow` or
//! `global`) and a storage backend. An [`Accessor`] binds one node to one
//! declaration and processes messages with `read`, `write` or `reset`
//! commands, optionally overridden per message. Writes are type checked and
//! only reach the store when the value actually changes; a block-if rule can
//! suppress propagation of the result.
//!
//! ```
//! use std::sync::Arc;
//!
//! use persistent_values::{
//!     Accessor, AccessorConfig, Datatype, MemoryContextStore, Message, RecordingSink,
//!     RegistryStore, ValueDeclaration, ValueRegistry,
//! };
//! use serde_json::json;
//!
//! let registries = RegistryStore::new();
//! registries.save(
//!     "config",
//!     ValueRegistry::new("config", "Settings")
//!         .with_value(ValueDeclaration::new("threshold", Datatype::Number, json!(23))),
//! );
//!
//! let config = AccessorConfig::from_value(json!({
//!     "id": "node-1",
//!     "valuesConfig": "config",
//!     "value": "threshold",
//! }))
//! .unwrap();
//! let accessor = Accessor::new(
//!     &config,
//!     &registries,
//!     Arc::new(MemoryContextStore::new()),
//!     Arc::new(RecordingSink::new()),
//! )
//! .unwrap();
//!
//! let outputs = accessor.on_input(Message::new());
//! assert_eq!(outputs.primary.unwrap().get("payload"), Some(&json!(23)));
//! ```

pub mod accessor;
pub mod coercion;
pub mod context;
pub mod error;
pub mod logger;
pub mod message;
pub mod values;

pub use accessor::{Accessor, AccessorConfig, Command, NodeStatus, Outputs};
pub use context::{ContextStore, MemoryContextStore};
pub use error::{CoercionError, ConfigError, EventError, MessageError, RegistryError};
pub use logger::{LogSink, NodeSink, RecordingSink};
pub use message::Message;
pub use values::{store_key, Datatype, RegistryStore, Scope, ValueDeclaration, ValueRegistry};
