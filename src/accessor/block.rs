//! Block-if policy: suppress propagation when the value matches a rule.

use std::fmt;

use serde_json::Value;

use crate::coercion::{coerce_literal, deep_equal, RuntimeKind};
use crate::logger::NodeSink;
use crate::values::Datatype;

/// Comparison rule of the block policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockRule {
    /// Block when the value equals the comparison value.
    Eq,
    /// Block when the value differs from the comparison value.
    Neq,
    Other(String),
}

impl BlockRule {
    pub fn as_str(&self) -> &str {
        match self {
            BlockRule::Eq => "eq",
            BlockRule::Neq => "neq",
            BlockRule::Other(raw) => raw,
        }
    }
}

impl From<String> for BlockRule {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "eq" => BlockRule::Eq,
            "neq" => BlockRule::Neq,
            _ => BlockRule::Other(raw),
        }
    }
}

impl fmt::Display for BlockRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockPolicy {
    enabled: bool,
    rule: BlockRule,
    compare: Option<Value>,
}

impl BlockPolicy {
    /// A policy that never blocks.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            rule: BlockRule::Eq,
            compare: None,
        }
    }

    /// Build an enabled policy, coercing `literal` to `datatype`.
    ///
    /// A literal that cannot be coerced is reported on the error channel and
    /// leaves the policy without a comparison value; it then never blocks.
    pub fn new(rule: BlockRule, literal: Option<&Value>, datatype: &Datatype, sink: &dyn NodeSink) -> Self {
        let compare = match coerce_literal(literal, datatype) {
            Ok(value) => Some(value),
            Err(e) => {
                sink.error(&e.to_string());
                None
            }
        };
        Self {
            enabled: true,
            rule,
            compare,
        }
    }

    pub fn compare_value(&self) -> Option<&Value> {
        self.compare.as_ref()
    }

    /// Whether `value` must be blocked.
    ///
    /// Values of another runtime kind than the comparison value (or a
    /// missing comparison value) never block; neither does an unknown rule.
    pub fn evaluate(&self, value: &Value, sink: &dyn NodeSink) -> bool {
        if !self.enabled {
            return false;
        }

        let value_kind = RuntimeKind::of(value);
        let compare = match &self.compare {
            Some(compare) if RuntimeKind::of(compare) == value_kind => compare,
            other => {
                let compare_kind = other
                    .as_ref()
                    .map_or("undefined", |c| RuntimeKind::of(c).as_str());
                sink.warn(&format!(
                    "Type mismatch of block flow values. Type of persistent value: {}. \
                     Type of compare value: {}. Skipping blocking value check.",
                    value_kind, compare_kind
                ));
                return false;
            }
        };

        let blocked = match &self.rule {
            BlockRule::Eq => deep_equal(value, compare),
            BlockRule::Neq => !deep_equal(value, compare),
            BlockRule::Other(raw) => {
                sink.warn(&format!(
                    "Unknown block-if rule '{}'. Skipping blocking value check.",
                    raw
                ));
                false
            }
        };
        log::debug!("Block-if rule '{}' evaluated to {}", self.rule, blocked);
        blocked
    }
}

impl Default for BlockPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::RecordingSink;
    use serde_json::json;

    fn policy(rule: &str, literal: Value, datatype: Datatype, sink: &RecordingSink) -> BlockPolicy {
        BlockPolicy::new(BlockRule::from(rule.to_string()), Some(&literal), &datatype, sink)
    }

    #[test]
    fn test_disabled_never_blocks() {
        let sink = RecordingSink::new();
        assert!(!BlockPolicy::disabled().evaluate(&json!(true), &sink));
        assert!(sink.warnings().is_empty());
    }

    #[test]
    fn test_eq_blocks_on_equal_values() {
        let sink = RecordingSink::new();
        assert!(policy("eq", json!("true"), Datatype::Boolean, &sink).evaluate(&json!(true), &sink));
        assert!(policy("eq", json!(2305), Datatype::Number, &sink).evaluate(&json!(2305), &sink));
        assert!(policy("eq", json!("match me"), Datatype::String, &sink).evaluate(&json!("match me"), &sink));
        let text = serde_json::to_string_pretty(&json!({"boolean": true, "string": "match me"})).unwrap();
        assert!(policy("eq", json!(text), Datatype::Json, &sink)
            .evaluate(&json!({"string": "match me", "boolean": true}), &sink));
    }

    #[test]
    fn test_eq_passes_different_values() {
        let sink = RecordingSink::new();
        let p = policy("eq", json!("does not match"), Datatype::String, &sink);
        assert!(!p.evaluate(&json!("any input string"), &sink));
    }

    #[test]
    fn test_neq() {
        let sink = RecordingSink::new();
        let p = policy("neq", json!("false"), Datatype::Boolean, &sink);
        assert!(p.evaluate(&json!(true), &sink));
        assert!(!p.evaluate(&json!(false), &sink));
    }

    #[test]
    fn test_type_mismatch_never_blocks() {
        let sink = RecordingSink::new();
        let p = policy("eq", json!(2305), Datatype::Number, &sink);
        assert!(!p.evaluate(&json!("2305"), &sink));
        assert!(sink.warned("Type mismatch of block flow values"));
    }

    #[test]
    fn test_failed_coercion_reports_error_and_never_blocks() {
        let sink = RecordingSink::new();
        let p = policy("eq", json!(2305), Datatype::Boolean, &sink);
        assert!(sink.errored("Failed to convert value"));
        assert!(p.compare_value().is_none());
        assert!(!p.evaluate(&json!(2305), &sink));
        assert!(sink.warned("Type of compare value: undefined"));

        let p = policy("eq", json!("{ incomplete JSON: X"), Datatype::Json, &sink);
        assert!(!p.evaluate(&json!({"valid": "JSON object"}), &sink));
    }

    #[test]
    fn test_missing_literal_never_blocks() {
        let sink = RecordingSink::new();
        let p = BlockPolicy::new(BlockRule::Eq, None, &Datatype::String, &sink);
        assert!(!p.evaluate(&json!("valid string"), &sink));
    }

    #[test]
    fn test_unsupported_datatype_never_blocks() {
        let sink = RecordingSink::new();
        let p = policy("eq", json!(true), Datatype::Other("not supported datatype".into()), &sink);
        assert!(sink.errored("Unsupported compare value type"));
        assert!(!p.evaluate(&json!(true), &sink));
    }

    #[test]
    fn test_unknown_rule_never_blocks() {
        let sink = RecordingSink::new();
        let p = policy("eqNOT_SUPPORTED_RULE", json!(2305), Datatype::Number, &sink);
        assert!(!p.evaluate(&json!(2305), &sink));
        assert!(sink.warned("Unknown block-if rule"));
    }
}
