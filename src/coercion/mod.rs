//! Type validation and literal coercion for declared datatypes.
//!
//! Runtime values are `serde_json::Value`s. Their *kind* follows the
//! host's dynamic type model: booleans, numbers and strings are primitive
//! kinds, while `null`, arrays and objects all share the object kind.

pub mod equality;

pub use equality::deep_equal;

use std::fmt;

use serde_json::{Number, Value};

use crate::error::CoercionError;
use crate::values::Datatype;

/// Dynamic kind of a runtime value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeKind {
    Boolean,
    Number,
    String,
    Object,
}

impl RuntimeKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Bool(_) => RuntimeKind::Boolean,
            Value::Number(_) => RuntimeKind::Number,
            Value::String(_) => RuntimeKind::String,
            Value::Null | Value::Array(_) | Value::Object(_) => RuntimeKind::Object,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeKind::Boolean => "boolean",
            RuntimeKind::Number => "number",
            RuntimeKind::String => "string",
            RuntimeKind::Object => "object",
        }
    }
}

impl fmt::Display for RuntimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `value` structurally matches the declared datatype.
///
/// `json` accepts anything that serializes as pure JSON. Unsupported
/// datatypes never match.
pub fn matches_declared_type(value: &Value, datatype: &Datatype) -> bool {
    let kind = RuntimeKind::of(value);
    match datatype {
        Datatype::Boolean => kind == RuntimeKind::Boolean,
        Datatype::Number => kind == RuntimeKind::Number,
        Datatype::String => kind == RuntimeKind::String,
        Datatype::Json => serde_json::to_string(value).is_ok(),
        Datatype::Other(_) => false,
    }
}

/// Convert a configuration literal into a runtime value of `datatype`.
///
/// * `bool`: only the strings `"true"` and `"false"`.
/// * `num`: numbers, numeric strings (decimal, exponent, `0x`/`0o`/`0b`
///   prefixes, blank is zero), booleans and `null`; non-finite results fail.
/// * `str`: any present literal except `null`; strings verbatim, everything
///   else by its textual form.
/// * `json`: a string holding JSON text.
///
/// An absent literal (`None`) fails for every datatype.
pub fn coerce_literal(literal: Option<&Value>, datatype: &Datatype) -> Result<Value, CoercionError> {
    let converted = match datatype {
        Datatype::Boolean => literal.and_then(coerce_boolean),
        Datatype::Number => literal.and_then(coerce_number),
        Datatype::String => literal.and_then(coerce_string),
        Datatype::Json => literal.and_then(coerce_json),
        Datatype::Other(raw) => return Err(CoercionError::UnsupportedDatatype(raw.clone())),
    };

    converted.ok_or_else(|| CoercionError::Conversion {
        literal: literal.map_or_else(|| "undefined".to_string(), literal_text),
        datatype: datatype.code().to_string(),
    })
}

fn coerce_boolean(literal: &Value) -> Option<Value> {
    match literal.as_str() {
        Some("true") => Some(Value::Bool(true)),
        Some("false") => Some(Value::Bool(false)),
        _ => None,
    }
}

fn coerce_number(literal: &Value) -> Option<Value> {
    let parsed = match literal {
        Value::Number(n) => return Some(Value::Number(n.clone())),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::String(s) => parse_numeric(s),
        Value::Array(_) | Value::Object(_) => None,
    }?;
    number_value(parsed)
}

fn parse_numeric(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }

    let radix = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)]
        .iter()
        .find_map(|(prefix, radix)| trimmed.strip_prefix(prefix).map(|digits| (digits, *radix)));
    if let Some((digits, radix)) = radix {
        return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
    }

    // Rust also accepts "inf"/"nan" spellings; only plain numerals count.
    let numeral = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !numeral {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn number_value(n: f64) -> Option<Value> {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        return Some(Value::Number(Number::from(n as i64)));
    }
    Number::from_f64(n).map(Value::Number)
}

fn coerce_string(literal: &Value) -> Option<Value> {
    match literal {
        Value::Null => None,
        Value::String(s) => Some(Value::String(s.clone())),
        other => Some(Value::String(other.to_string())),
    }
}

fn coerce_json(literal: &Value) -> Option<Value> {
    literal
        .as_str()
        .and_then(|text| serde_json::from_str(text).ok())
}

fn literal_text(literal: &Value) -> String {
    match literal {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
