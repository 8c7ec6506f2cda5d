//! Schema-driven parsing of untyped launch data into typed records.
//!
//! A record describes its schema by implementing [`Schema`] for a [`Source`]:
//! every field is read with [`Fields::field`], which pairs a source key with a
//! field parser. Fields are read in declaration order and the first failure
//! aborts the whole record, wrapped in [`ParseError::Field`] with the offending
//! key. Optional fields use the `opt_*` parsers, which turn a missing (or
//! JSON `null`) value into `None` instead of an error.
//!
//! Two sources share the engine:
//! - [`SearchParams`](crate::location::SearchParams): raw values are `&str`,
//!   see [`search_params`].
//! - [`JsonObject`]: raw values are [`serde_json::Value`], see [`json`].
//!
//! ```
//! use twa_bridge::parsing::{json, Fields, JsonObject, Schema};
//! use twa_bridge::ParseError;
//!
//! struct Point {
//!     x: i64,
//!     label: Option<String>,
//! }
//!
//! impl Schema<JsonObject> for Point {
//!     fn from_fields(f: &Fields<'_, JsonObject>) -> Result<Self, ParseError> {
//!         Ok(Point {
//!             x: f.field("x", json::int)?,
//!             label: f.field("label", json::opt_string)?,
//!         })
//!     }
//! }
//!
//! let p: Point = json::parse_struct_str(r#"{"x": 3}"#).unwrap();
//! assert_eq!(p.x, 3);
//! assert!(p.label.is_none());
//! ```

pub mod json;
pub mod search_params;

use serde_json::Value;

use crate::{error::ParseError, location::SearchParams};

/// A JSON object as decoded by `serde_json`.
pub type JsonObject = serde_json::Map<String, Value>;

/// Something a raw value can be fetched from by key.
pub trait Source {
    type Raw: ?Sized;

    fn raw(&self, key: &str) -> Option<&Self::Raw>;
}

impl Source for SearchParams {
    type Raw = str;

    fn raw(&self, key: &str) -> Option<&str> {
        self.get(key)
    }
}

impl Source for JsonObject {
    type Raw = Value;

    fn raw(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

/// Read-only view over a source handed to [`Schema::from_fields`].
pub struct Fields<'s, S: ?Sized> {
    source: &'s S,
}

impl<'s, S> Fields<'s, S>
where
    S: Source + ?Sized,
    S::Raw: 's,
{
    pub fn new(source: &'s S) -> Self {
        Self { source }
    }

    /// Runs `parser` on the raw value stored under `key`.
    pub fn field<T, P>(&self, key: &str, parser: P) -> Result<T, ParseError>
    where
        P: FnOnce(Option<&'s S::Raw>) -> Result<T, ParseError>,
    {
        parser(self.source.raw(key)).map_err(|cause| ParseError::Field {
            key: key.to_string(),
            cause: Box::new(cause),
        })
    }

    pub fn source(&self) -> &'s S {
        self.source
    }
}

/// A record that can be assembled from a source `S`.
pub trait Schema<S: Source + ?Sized>: Sized {
    fn from_fields(fields: &Fields<'_, S>) -> Result<Self, ParseError>;
}

/// Parses a whole record from `source`.
pub fn parse<S, T>(source: &S) -> Result<T, ParseError>
where
    S: Source + ?Sized,
    T: Schema<S>,
{
    T::from_fields(&Fields::new(source))
}

/// Human readable name of a JSON value's type, for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
