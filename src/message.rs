//! Event messages with dotted-path property access.
//!
//! A message is an open JSON object. Properties are addressed with
//! expressions such as `payload`, `output.previous` or `list[0].name`.
//! Setting a property creates missing intermediate objects (or arrays when
//! the next segment is an index) but refuses to overwrite an existing
//! primitive on the way.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MessageError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

fn parse_path(path: &str) -> Result<Vec<Segment>, MessageError> {
    let invalid = || MessageError::InvalidPath(path.to_string());
    let mut segments = Vec::new();
    let mut chars = path.chars().peekable();
    let mut current = String::new();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if current.is_empty() && !matches!(segments.last(), Some(Segment::Index(_))) {
                    return Err(invalid());
                }
                if !current.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut current)));
                }
                if chars.peek().is_none() {
                    return Err(invalid());
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut current)));
                }
                let mut inner = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(ch) => inner.push(ch),
                        None => return Err(invalid()),
                    }
                }
                let inner = inner.trim();
                let quoted = (inner.starts_with('"') && inner.ends_with('"'))
                    || (inner.starts_with('\'') && inner.ends_with('\''));
                if quoted && inner.len() >= 2 {
                    segments.push(Segment::Key(inner[1..inner.len() - 1].to_string()));
                } else {
                    let index = inner.parse::<usize>().map_err(|_| invalid())?;
                    segments.push(Segment::Index(index));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        segments.push(Segment::Key(current));
    }

    match segments.first() {
        Some(Segment::Key(_)) => Ok(segments),
        _ => Err(invalid()),
    }
}

/// JSON Pointer (RFC 6901) addressing `segments`.
fn to_pointer(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Key(key) => format!("/{}", key.replace('~', "~0").replace('/', "~1")),
            Segment::Index(index) => format!("/{}", index),
        })
        .collect()
}

/// Assign `value` at `segments` below `target`, replacing `null`
/// intermediates with the container the next segment needs.
///
/// Indices must already be checked: at most one past the end of an
/// existing array, `0` for a new one.
fn assign(target: &mut Value, segments: &[Segment], value: Value) {
    let Some((segment, rest)) = segments.split_first() else {
        *target = value;
        return;
    };
    match segment {
        Segment::Key(key) => {
            if !target.is_object() {
                *target = Value::Object(Map::new());
            }
            if let Value::Object(map) = target {
                let entry = map.entry(key.clone()).or_insert(Value::Null);
                assign(entry, rest, value);
            }
        }
        Segment::Index(index) => {
            if !target.is_array() {
                *target = Value::Array(Vec::new());
            }
            if let Value::Array(items) = target {
                if *index == items.len() {
                    items.push(Value::Null);
                }
                if let Some(slot) = items.get_mut(*index) {
                    assign(slot, rest, value);
                }
            }
        }
    }
}

/// A branch that does not exist yet can only start new arrays at index 0.
fn check_new_branch(path: &str, segments: &[Segment]) -> Result<(), MessageError> {
    if segments
        .iter()
        .any(|segment| matches!(segment, Segment::Index(index) if *index > 0))
    {
        return Err(MessageError::IndexOutOfRange(path.to_string()));
    }
    Ok(())
}

/// An event message: a JSON object passed between nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(Map<String, Value>);

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value. Returns `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Value at `path`, if every segment exists.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments = parse_path(path).ok()?;
        let (Segment::Key(first), rest) = segments.split_first()? else {
            return None;
        };
        self.0.get(first)?.pointer(&to_pointer(rest))
    }

    /// Set the property at `path`, creating intermediate containers.
    ///
    /// # Errors
    ///
    /// [`MessageError::InvalidPath`] for malformed expressions,
    /// [`MessageError::NotAContainer`] when an existing intermediate value is
    /// neither an object nor an array, and [`MessageError::IndexOutOfRange`]
    /// for indices more than one past the end of an array. The message is
    /// unchanged on error.
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), MessageError> {
        let segments = parse_path(path)?;
        self.check_settable(path, &segments)?;

        if let Some((Segment::Key(first), rest)) = segments.split_first() {
            let entry = self.0.entry(first.clone()).or_insert(Value::Null);
            assign(entry, rest, value);
        }
        Ok(())
    }

    fn check_settable(&self, path: &str, segments: &[Segment]) -> Result<(), MessageError> {
        let Some((Segment::Key(first), rest)) = segments.split_first() else {
            return Err(MessageError::InvalidPath(path.to_string()));
        };
        let Some(root) = self.0.get(first) else {
            return check_new_branch(path, rest);
        };
        for (depth, segment) in rest.iter().enumerate() {
            let Some(value) = root.pointer(&to_pointer(&rest[..depth])) else {
                return check_new_branch(path, &rest[depth..]);
            };
            match (value, segment) {
                (Value::Object(_), Segment::Key(_)) => {}
                (Value::Array(items), Segment::Index(index)) if *index <= items.len() => {}
                (Value::Array(_), Segment::Index(_)) => {
                    return Err(MessageError::IndexOutOfRange(path.to_string()))
                }
                (Value::Null, _) => return check_new_branch(path, &rest[depth..]),
                _ => return Err(MessageError::NotAContainer(path.to_string())),
            }
        }
        Ok(())
    }
}

impl From<Map<String, Value>> for Message {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Message> for Value {
    fn from(message: Message) -> Self {
        message.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn msg(value: Value) -> Message {
        Message::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_path() {
        assert_eq!(
            parse_path("a.b[2].c").unwrap(),
            vec![
                Segment::Key("a".into()),
                Segment::Key("b".into()),
                Segment::Index(2),
                Segment::Key("c".into()),
            ]
        );
        assert_eq!(
            parse_path(r#"a["b c"]"#).unwrap(),
            vec![Segment::Key("a".into()), Segment::Key("b c".into())]
        );
        assert!(parse_path("").is_err());
        assert!(parse_path("a..b").is_err());
        assert!(parse_path("a.").is_err());
        assert!(parse_path("[0]").is_err());
        assert!(parse_path("a[x]").is_err());
        assert!(parse_path("a[1").is_err());
    }

    #[test]
    fn test_get_nested() {
        let m = msg(json!({"payload": 1, "output": {"list": [{"name": "x"}]}}));
        assert_eq!(m.get("payload"), Some(&json!(1)));
        assert_eq!(m.get("output.list[0].name"), Some(&json!("x")));
        assert_eq!(m.get("output.missing"), None);
        assert_eq!(m.get("payload.deeper"), None);
    }

    #[test]
    fn test_get_present_null() {
        let m = msg(json!({"payload": null, "a/b": {"~x": 1}}));
        assert_eq!(m.get("payload"), Some(&Value::Null));
        assert_eq!(m.get("topic"), None);
        assert_eq!(m.get(r#"a/b["~x"]"#), Some(&json!(1)));
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut m = msg(json!({"payload": "x"}));
        m.set("output.non_default_output_property", json!("❤ Node-RED")).unwrap();
        assert_eq!(
            m.into_value(),
            json!({"payload": "x", "output": {"non_default_output_property": "❤ Node-RED"}})
        );
    }

    #[test]
    fn test_set_creates_arrays_for_indices() {
        let mut m = Message::new();
        m.set("list[0].name", json!("a")).unwrap();
        m.set("list[1].name", json!("b")).unwrap();
        assert_eq!(m.into_value(), json!({"list": [{"name": "a"}, {"name": "b"}]}));
    }

    #[test]
    fn test_set_rejects_index_past_array_end() {
        let mut m = msg(json!({"list": [1, 2]}));
        m.set("list[2]", json!(3)).unwrap();
        assert_eq!(
            m.set("list[4]", json!(5)),
            Err(MessageError::IndexOutOfRange("list[4]".to_string()))
        );
        assert!(m.set("fresh[1]", json!(1)).is_err());
        assert!(m.set("fresh.nested[100000000000]", json!(1)).is_err());
        assert_eq!(m.get("fresh"), None);
        assert_eq!(m.get("list"), Some(&json!([1, 2, 3])));
    }

    #[test]
    fn test_set_huge_index_is_an_error() {
        let mut m = Message::new();
        let path = format!("out[{}]", usize::MAX);
        assert_eq!(m.set(&path, json!(true)), Err(MessageError::IndexOutOfRange(path.clone())));
        let mut m = msg(json!({"out": []}));
        assert!(m.set(&path, json!(true)).is_err());
        assert_eq!(m.get("out"), Some(&json!([])));
    }

    #[test]
    fn test_set_into_existing_object() {
        let mut m = msg(json!({"output": {"a": 1}}));
        m.set("output.b", json!(2)).unwrap();
        assert_eq!(m.get("output"), Some(&json!({"a": 1, "b": 2})));
    }

    #[test]
    fn test_set_refuses_primitive_intermediate() {
        let mut m = msg(json!({"payload": "any input string"}));
        let err = m.set("payload.collected_values", json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Failed to create Object at msg.payload.collected_values");
        assert_eq!(m.get("payload"), Some(&json!("any input string")));
    }

    #[test]
    fn test_set_replaces_null_intermediate() {
        let mut m = msg(json!({"output": null}));
        m.set("output.value", json!(3)).unwrap();
        assert_eq!(m.get("output.value"), Some(&json!(3)));
    }

    #[test]
    fn test_set_top_level_overwrites() {
        let mut m = msg(json!({"payload": {"deep": true}}));
        m.set("payload", json!(23)).unwrap();
        assert_eq!(m.get("payload"), Some(&json!(23)));
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(Message::from_value(json!([1, 2])).is_none());
        assert!(Message::from_value(json!("text")).is_none());
    }
}
