//! Value selection: configured declaration vs. per-message override.

use serde_json::Value;

use crate::logger::NodeSink;
use crate::message::Message;
use crate::values::{ValueDeclaration, ValueRegistry};

/// Declaration chosen for one message.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub declaration: &'a ValueDeclaration,
    /// A dynamic override picked a declaration other than the configured one.
    pub overridden: bool,
}

/// Picks the effective declaration of a message.
#[derive(Debug, Clone)]
pub struct ValueSelector {
    enabled: bool,
    override_property: String,
}

impl ValueSelector {
    pub fn new(enabled: bool, override_property: impl Into<String>) -> Self {
        Self {
            enabled,
            override_property: override_property.into(),
        }
    }

    /// Select the declaration for `msg`.
    ///
    /// With overrides enabled and the override property present, the
    /// registry is searched by name. An unknown name is reported as a warning
    /// and the configured declaration is kept.
    pub fn select<'a>(
        &self,
        registry: &'a ValueRegistry,
        configured: &'a ValueDeclaration,
        msg: &Message,
        sink: &dyn NodeSink,
    ) -> Selection<'a> {
        let unchanged = Selection {
            declaration: configured,
            overridden: false,
        };
        if !self.enabled {
            return unchanged;
        }
        let Some(requested) = msg.get(&self.override_property) else {
            return unchanged;
        };

        let found = requested.as_str().and_then(|name| registry.find_by_name(name));
        match found {
            Some(declaration) => Selection {
                declaration,
                overridden: !same_declaration(declaration, configured),
            },
            None => {
                let shown = match requested {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                sink.warn(&format!(
                    "Value '{}' set via msg.{} not found in configuration '{}'! \
                     Falling back to configured value '{}'.",
                    shown, self.override_property, registry.name, configured.name
                ));
                unchanged
            }
        }
    }
}

fn same_declaration(a: &ValueDeclaration, b: &ValueDeclaration) -> bool {
    match (&a.id, &b.id) {
        (Some(x), Some(y)) => x == y,
        _ => a.name == b.name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::RecordingSink;
    use crate::values::Datatype;
    use serde_json::json;

    fn registry() -> ValueRegistry {
        ValueRegistry::new("config", "TestConfig")
            .with_value(ValueDeclaration::new("string", Datatype::String, json!("")))
            .with_value(ValueDeclaration::new("number", Datatype::Number, json!(23)))
    }

    fn msg(value: Value) -> Message {
        Message::from_value(value).unwrap()
    }

    #[test]
    fn test_disabled_ignores_override() {
        let registry = registry();
        let sink = RecordingSink::new();
        let selector = ValueSelector::new(false, "override_topic");
        let selection = selector.select(
            &registry,
            &registry.values[0],
            &msg(json!({"override_topic": "number"})),
            &sink,
        );
        assert_eq!(selection.declaration.name, "string");
        assert!(!selection.overridden);
    }

    #[test]
    fn test_override_selects_by_name() {
        let registry = registry();
        let sink = RecordingSink::new();
        let selector = ValueSelector::new(true, "override_topic");
        let selection = selector.select(
            &registry,
            &registry.values[0],
            &msg(json!({"override_topic": "number"})),
            &sink,
        );
        assert_eq!(selection.declaration.name, "number");
        assert!(selection.overridden);
    }

    #[test]
    fn test_override_of_configured_value_is_not_flagged() {
        let registry = registry();
        let sink = RecordingSink::new();
        let selector = ValueSelector::new(true, "value");
        let selection = selector.select(&registry, &registry.values[1], &msg(json!({"value": "number"})), &sink);
        assert!(!selection.overridden);
    }

    #[test]
    fn test_missing_override_property_keeps_configured() {
        let registry = registry();
        let sink = RecordingSink::new();
        let selector = ValueSelector::new(true, "override_topic");
        let selection = selector.select(&registry, &registry.values[1], &msg(json!({"payload": 4223})), &sink);
        assert_eq!(selection.declaration.name, "number");
        assert!(sink.warnings().is_empty());
    }

    #[test]
    fn test_unknown_override_warns_and_falls_back() {
        let registry = registry();
        let sink = RecordingSink::new();
        let selector = ValueSelector::new(true, "value");
        let selection = selector.select(&registry, &registry.values[0], &msg(json!({"value": false})), &sink);
        assert_eq!(selection.declaration.name, "string");
        let warning = sink.warnings().remove(0).to_lowercase();
        assert!(warning.contains("'false'"));
        assert!(warning.contains("not found"));
        assert!(warning.contains("falling back to configured value 'string'"));
    }
}
