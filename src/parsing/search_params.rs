//! Field parsers for form-urlencoded sources, where every value is a string.

use chrono::{DateTime, Utc};

use super::{json, parse, JsonObject, Schema};
use crate::{error::ParseError, location::SearchParams};

/// Parses a record from a query string.
pub fn parse_query<T: Schema<SearchParams>>(query: &str) -> Result<T, ParseError> {
    parse(&SearchParams::parse(query))
}

pub fn string(value: Option<&str>) -> Result<String, ParseError> {
    value
        .map(str::to_string)
        .ok_or_else(|| ParseError::missing("string"))
}

pub fn opt_string(value: Option<&str>) -> Result<Option<String>, ParseError> {
    Ok(value.map(str::to_string))
}

/// Decimal integer; an empty value is invalid.
pub fn int(value: Option<&str>) -> Result<i64, ParseError> {
    let raw = value.ok_or_else(|| ParseError::missing("int"))?;
    raw.trim()
        .parse()
        .map_err(|_| ParseError::mismatch("int", format!("\"{raw}\"")))
}

pub fn opt_int(value: Option<&str>) -> Result<Option<i64>, ParseError> {
    value.map(|v| int(Some(v))).transpose()
}

/// Whole seconds since the unix epoch.
pub fn date(value: Option<&str>) -> Result<DateTime<Utc>, ParseError> {
    let raw = value.ok_or_else(|| ParseError::missing("date"))?;
    let secs: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ParseError::mismatch("date", format!("\"{raw}\"")))?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| ParseError::mismatch("date", secs))
}

pub fn opt_date(value: Option<&str>) -> Result<Option<DateTime<Utc>>, ParseError> {
    value.map(|v| date(Some(v))).transpose()
}

/// A parameter carrying a JSON object string, parsed as record `T`.
pub fn json_struct<T: Schema<JsonObject>>(value: Option<&str>) -> Result<T, ParseError> {
    let raw = value.ok_or_else(|| ParseError::missing("object"))?;
    json::parse_struct_str(raw)
}

pub fn opt_json_struct<T: Schema<JsonObject>>(value: Option<&str>) -> Result<Option<T>, ParseError> {
    value.map(|v| json_struct(Some(v))).transpose()
}
