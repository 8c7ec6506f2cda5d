//! Field parsers for JSON object sources.
//!
//! Required parsers fail on a missing value; `opt_*` variants return `None`
//! for a missing key or an explicit `null`.

use serde_json::Value;

use super::{json_kind, parse, JsonObject, Schema};
use crate::{colors::to_rgb_ext, error::ParseError};

/// Decodes `input` as JSON and checks it is an object.
pub fn decode_object(input: &str) -> Result<JsonObject, ParseError> {
    let value: Value = serde_json::from_str(input).map_err(ParseError::MalformedInput)?;
    into_object(value)
}

/// Checks that an already decoded value is an object.
pub fn into_object(value: Value) -> Result<JsonObject, ParseError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ParseError::InvalidShape {
            found: json_kind(&other),
        }),
    }
}

/// Parses a record from a JSON value, which must be an object.
pub fn parse_struct<T: Schema<JsonObject>>(value: &Value) -> Result<T, ParseError> {
    match value {
        Value::Object(map) => parse(map),
        other => Err(ParseError::InvalidShape {
            found: json_kind(other),
        }),
    }
}

/// Parses a record from a JSON string.
pub fn parse_struct_str<T: Schema<JsonObject>>(input: &str) -> Result<T, ParseError> {
    parse(&decode_object(input)?)
}

/// Nested record field: an object, or a string holding one.
pub fn structure<T: Schema<JsonObject>>(value: Option<&Value>) -> Result<T, ParseError> {
    match value {
        None | Some(Value::Null) => Err(ParseError::missing("object")),
        Some(Value::String(s)) => parse_struct_str(s),
        Some(v) => parse_struct(v),
    }
}

pub fn opt_structure<T: Schema<JsonObject>>(value: Option<&Value>) -> Result<Option<T>, ParseError> {
    optional(value, structure)
}

/// Integer; only native JSON numbers without a fractional part are accepted.
pub fn int(value: Option<&Value>) -> Result<i64, ParseError> {
    match value {
        Some(v) => v.as_i64().ok_or_else(|| ParseError::mismatch("int", v)),
        None => Err(ParseError::missing("int")),
    }
}

pub fn opt_int(value: Option<&Value>) -> Result<Option<i64>, ParseError> {
    optional(value, int)
}

/// Any JSON number.
pub fn number(value: Option<&Value>) -> Result<f64, ParseError> {
    match value {
        Some(v) => v.as_f64().ok_or_else(|| ParseError::mismatch("number", v)),
        None => Err(ParseError::missing("number")),
    }
}

pub fn string(value: Option<&Value>) -> Result<String, ParseError> {
    match value {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(v) => Err(ParseError::mismatch("string", v)),
        None => Err(ParseError::missing("string")),
    }
}

pub fn opt_string(value: Option<&Value>) -> Result<Option<String>, ParseError> {
    optional(value, string)
}

/// Boolean; strings such as `"true"` are rejected.
pub fn boolean(value: Option<&Value>) -> Result<bool, ParseError> {
    match value {
        Some(Value::Bool(b)) => Ok(*b),
        Some(v) => Err(ParseError::mismatch("boolean", v)),
        None => Err(ParseError::missing("boolean")),
    }
}

pub fn opt_boolean(value: Option<&Value>) -> Result<Option<bool>, ParseError> {
    optional(value, boolean)
}

/// Color string in any known RGB notation, normalized to `#rrggbb`.
pub fn rgb(value: Option<&Value>) -> Result<String, ParseError> {
    let raw = string(value)?;
    to_rgb_ext(&raw).map_err(|_| ParseError::mismatch("rgb color", raw))
}

pub fn opt_rgb(value: Option<&Value>) -> Result<Option<String>, ParseError> {
    optional(value, rgb)
}

fn optional<'a, T>(
    value: Option<&'a Value>,
    parser: impl FnOnce(Option<&'a Value>) -> Result<T, ParseError>,
) -> Result<Option<T>, ParseError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        some => parser(some).map(Some),
    }
}
