//! Value declarations: the typed description of one persisted value.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::CoercionError;

/// Storage name meaning "use the host's configured default backend".
pub const STORAGE_DEFAULT: &str = "default";

/// Declared datatype of a persistent value.
///
/// Serialized with the configuration codes `bool`, `num`, `str` and `json`.
/// Unknown codes are kept as [`Datatype::Other`] so that a registry with an
/// unsupported datatype still loads; the accessor reports it when used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Datatype {
    Boolean,
    Number,
    String,
    Json,
    Other(String),
}

impl Datatype {
    /// The configuration code (`bool`, `num`, `str`, `json`).
    pub fn code(&self) -> &str {
        match self {
            Datatype::Boolean => "bool",
            Datatype::Number => "num",
            Datatype::String => "str",
            Datatype::Json => "json",
            Datatype::Other(raw) => raw,
        }
    }

    /// Human readable name used in status texts.
    pub fn display_name(&self) -> &str {
        match self {
            Datatype::Boolean => "boolean",
            Datatype::Number => "number",
            Datatype::String => "string",
            Datatype::Json => "json",
            Datatype::Other(raw) => raw,
        }
    }
}

impl From<String> for Datatype {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "bool" | "boolean" => Datatype::Boolean,
            "num" | "number" => Datatype::Number,
            "str" | "string" => Datatype::String,
            "json" => Datatype::Json,
            _ => Datatype::Other(raw),
        }
    }
}

impl From<Datatype> for String {
    fn from(datatype: Datatype) -> Self {
        datatype.code().to_string()
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Context namespace a value lives in.
///
/// Unknown scope names are preserved in [`Scope::Other`]; resolving them
/// against the context store fails per event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scope {
    Node,
    Flow,
    Global,
    Other(String),
}

impl Scope {
    pub fn as_str(&self) -> &str {
        match self {
            Scope::Node => "node",
            Scope::Flow => "flow",
            Scope::Global => "global",
            Scope::Other(raw) => raw,
        }
    }
}

impl From<String> for Scope {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "node" => Scope::Node,
            "flow" => Scope::Flow,
            "global" => Scope::Global,
            _ => Scope::Other(raw),
        }
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.as_str().to_string()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical persisted value inside a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDeclaration {
    /// Stable UUID. Absent for entries created before IDs existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Name, used as the second half of the store key.
    pub name: String,

    pub datatype: Datatype,

    /// Default literal. For `json` values this is the serialized JSON text.
    #[serde(default)]
    pub default: Value,

    pub scope: Scope,

    /// Storage backend name or [`STORAGE_DEFAULT`].
    #[serde(default = "default_storage")]
    pub storage: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

fn default_storage() -> String {
    STORAGE_DEFAULT.to_string()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ValueDeclaration {
    /// Create a declaration with a freshly generated ID, scope `global` and
    /// the default storage.
    pub fn new(name: impl Into<String>, datatype: Datatype, default: Value) -> Self {
        Self {
            id: Some(super::generate_value_id()),
            name: name.into(),
            datatype,
            default,
            scope: Scope::Global,
            storage: default_storage(),
            description: String::new(),
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_storage(mut self, storage: impl Into<String>) -> Self {
        self.storage = storage.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The runtime default value.
    ///
    /// `json` defaults are stored as JSON text and parsed here. A `json`
    /// default that is already structured is returned unchanged.
    pub fn default_value(&self) -> Result<Value, CoercionError> {
        match (&self.datatype, &self.default) {
            (Datatype::Json, Value::String(text)) => {
                serde_json::from_str(text).map_err(|_| CoercionError::Conversion {
                    literal: text.clone(),
                    datatype: self.datatype.code().to_string(),
                })
            }
            (_, value) => Ok(value.clone()),
        }
    }
}
