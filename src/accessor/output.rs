//! Accessor outputs and the metadata attached to messages.

use serde::Serialize;
use serde_json::Value;

use super::command::Command;
use crate::message::Message;
use crate::values::{ValueDeclaration, ValueRegistry};

/// The two outputs of one processed message.
///
/// `None` marks "no output" on that port.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outputs {
    /// The processed message unless it was blocked or failed.
    pub primary: Option<Message>,
    /// The same message, only when the value was persisted.
    pub on_change: Option<Message>,
}

impl Outputs {
    /// No output on either port.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.on_change.is_none()
    }

    /// Both ports as JSON, `null` for a missing output.
    pub fn into_array(self) -> [Value; 2] {
        [
            self.primary.map_or(Value::Null, Message::into_value),
            self.on_change.map_or(Value::Null, Message::into_value),
        ]
    }
}

/// Description of the effective value, attached when metadata output is on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// Registry name.
    pub config: String,
    /// Value name.
    pub value: String,
    /// Datatype code.
    pub datatype: String,
    /// Default literal as declared.
    pub default: Value,
    pub scope: String,
    pub storage: String,
    pub description: String,
    pub command: String,
}

impl Metadata {
    pub fn new(registry: &ValueRegistry, declaration: &ValueDeclaration, command: Command) -> Self {
        Self {
            config: registry.name.clone(),
            value: declaration.name.clone(),
            datatype: declaration.datatype.code().to_string(),
            default: declaration.default.clone(),
            scope: declaration.scope.to_string(),
            storage: declaration.storage.clone(),
            description: declaration.description.clone(),
            command: command.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::{Datatype, Scope};
    use serde_json::json;

    #[test]
    fn test_outputs_into_array() {
        let msg = Message::from_value(json!({"payload": 1})).unwrap();
        let outputs = Outputs {
            primary: Some(msg),
            on_change: None,
        };
        assert!(!outputs.is_empty());
        assert_eq!(outputs.into_array(), [json!({"payload": 1}), Value::Null]);
        assert!(Outputs::none().is_empty());
    }

    #[test]
    fn test_metadata_serialization() {
        let registry = ValueRegistry::new("config", "TestConfig");
        let declaration = ValueDeclaration::new("counter", Datatype::Number, json!(23))
            .with_scope(Scope::Flow)
            .with_description("Counts things");
        let meta = serde_json::to_value(Metadata::new(&registry, &declaration, Command::Write)).unwrap();
        assert_eq!(
            meta,
            json!({
                "config": "TestConfig",
                "value": "counter",
                "datatype": "num",
                "default": 23,
                "scope": "flow",
                "storage": "default",
                "description": "Counts things",
                "command": "write",
            })
        );
    }
}
