//! Node status summaries.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::values::{Datatype, ValueDeclaration, STORAGE_DEFAULT};

/// Text shown instead of structured JSON values.
pub const JSON_PLACEHOLDER: &str = "{JSON}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFill {
    Green,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusShape {
    Dot,
    Ring,
}

/// Status summary of an accessor after processing a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub fill: StatusFill,
    pub shape: StatusShape,
    pub text: String,
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fill = match self.fill {
            StatusFill::Green => "green",
            StatusFill::Red => "red",
        };
        write!(f, "{} ({})", self.text, fill)
    }
}

/// Build the status for `value` of `declaration`.
///
/// The text is `<value> [<datatype>,<scope>,<storage>]`. JSON values are
/// shown as `{JSON}`. The `default` storage is annotated with the host's
/// default backend when one is configured. When a dynamic override selected
/// the declaration, its name leads the tag: `[<name>: <datatype>,...]`.
pub fn build_status(
    value: &Value,
    declaration: &ValueDeclaration,
    default_storage: Option<&str>,
    overridden: bool,
    blocked: bool,
) -> NodeStatus {
    let mut storage = declaration.storage.clone();
    if storage == STORAGE_DEFAULT {
        if let Some(default) = default_storage {
            storage = format!("{} ({})", storage, default);
        }
    }

    let tag = format!(
        "{},{},{}",
        declaration.datatype.display_name(),
        declaration.scope,
        storage
    );
    let tag = if overridden {
        format!("[{}: {}]", declaration.name, tag)
    } else {
        format!("[{}]", tag)
    };

    NodeStatus {
        fill: if blocked { StatusFill::Red } else { StatusFill::Green },
        shape: StatusShape::Dot,
        text: format!("{} {}", render_value(value, &declaration.datatype), tag),
    }
}

fn render_value(value: &Value, datatype: &Datatype) -> String {
    match value {
        _ if *datatype == Datatype::Json => JSON_PLACEHOLDER.to_string(),
        Value::Array(_) | Value::Object(_) => JSON_PLACEHOLDER.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
