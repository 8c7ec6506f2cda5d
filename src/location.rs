//! Launch URL helpers: fragment parsing, form-encoded parameter sets and link checks.

use serde_json::Value;
use url::{form_urlencoded, Url};

use crate::{
    error::{BridgeError, Precondition},
    parsing::JsonObject,
};

/// Ordered, form-urlencoded key/value pairs (the shape of `URLSearchParams`).
///
/// Duplicate keys are kept; [`SearchParams::get`] returns the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pairs: Vec<(String, String)>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a query string. A single leading `?` is ignored.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Replaces the first `key` entry and drops the others, or appends.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter().position(|(k, _)| *k == key) {
            Some(idx) => {
                self.pairs[idx].1 = value;
                let mut seen = 0usize;
                self.pairs.retain(|(k, _)| {
                    if *k != key {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.pairs.push((key, value)),
        }
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.pairs.clone()
    }

    /// Encodes back to a query string (without the leading `?`).
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl FromIterator<(String, String)> for SearchParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// Path and query extracted from a location fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashParsed {
    pub path: String,
    pub query: SearchParams,
}

/// `true` when the text carries a query, either after `?` or as bare `k=v` pairs.
pub fn contains_query_string(text: &str) -> bool {
    text.contains(['=', '?'])
}

/// Splits the fragment of `location` into path and query.
///
/// When `location` has no `#` the whole string is treated as the fragment.
///
/// ```
/// use twa_bridge::location::parse_hash;
///
/// let parsed = parse_hash("https://game.com/#path?a=1");
/// assert_eq!(parsed.path, "path");
/// assert_eq!(parsed.query.get("a"), Some("1"));
/// ```
pub fn parse_hash(location: &str) -> HashParsed {
    let hash = match location.find('#') {
        Some(idx) => &location[idx + 1..],
        None => location,
    };

    if !contains_query_string(hash) {
        return HashParsed {
            path: hash.to_string(),
            query: SearchParams::new(),
        };
    }

    match hash.find('?') {
        Some(q) => HashParsed {
            path: hash[..q].to_string(),
            query: SearchParams::parse(&hash[q + 1..]),
        },
        None => HashParsed {
            path: String::new(),
            query: SearchParams::parse(hash),
        },
    }
}

/// Loosely typed decode of a query string.
///
/// Each value becomes an integer, a boolean, a JSON array/object when it is
/// bracketed and decodes cleanly, or stays a string.
pub fn parse_query_string(query: &str) -> JsonObject {
    let mut result = JsonObject::new();
    for (name, value) in SearchParams::parse(query).iter() {
        result.insert(name.to_string(), loose_value(value));
    }
    result
}

fn loose_value(value: &str) -> Value {
    if let Ok(int) = value.parse::<i64>() {
        return Value::from(int);
    }
    match value {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    let bracketed = (value.starts_with('[') && value.ends_with(']'))
        || (value.starts_with('{') && value.ends_with('}'));
    if bracketed {
        if let Ok(json) = serde_json::from_str(value) {
            return json;
        }
    }
    Value::String(value.to_string())
}

/// Normalizes an absolute `http`/`https` link.
pub fn format_url(raw: &str) -> Result<Url, BridgeError> {
    let url = Url::parse(raw).map_err(|e| Precondition::UrlNotAllowed {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Precondition::UrlNotAllowed {
            url: raw.to_string(),
            reason: format!("protocol \"{other}:\" is not supported"),
        }
        .into()),
    }
}
