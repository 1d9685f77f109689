// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Captured run-time values and their durable text encoding.
//!
//! The wire format is plain JSON for JSON-native values. Everything else is
//! written as a tagged object `{"$snap": <tag>, "v": <payload>}`:
//!
//! | tag         | payload                          |
//! |-------------|----------------------------------|
//! | `undefined` | none                             |
//! | `number`    | `"NaN"`, `"Infinity"`, `"-Infinity"` |
//! | `bigint`    | decimal string                   |
//! | `date`      | ISO-8601 string                  |
//! | `regexp`    | `{"source": .., "flags": ..}`    |
//! | `map`       | array of `[key, value]` pairs    |
//! | `set`       | array of members                 |
//! | `error`     | `{"name": .., "message": ..}`    |
//! | `function`  | function name                    |
//! | `symbol`    | symbol description               |
//! | `circular`  | none                             |
//! | `object`    | plain object that itself has a `$snap` key |
//!
//! The JavaScript half of the codec lives in the capture shim and must stay
//! in step with this module.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Number, Value as Json};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Key marking a tagged (non JSON-native) value
pub const TAG_KEY: &str = "$snap";

const PAYLOAD_KEY: &str = "v";

/// Largest integer a JavaScript number holds exactly
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Errors decoding a tagged value
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("unknown value tag: {0}")]
    UnknownTag(String),
    #[error("malformed {tag} value: {reason}")]
    Malformed { tag: String, reason: String },
}

/// A run-time value as captured from the instrumented program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Json", into = "Json")]
pub enum SnapValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(String),
    String(String),
    Date(String),
    RegExp { source: String, flags: String },
    Array(Vec<SnapValue>),
    Object(BTreeMap<String, SnapValue>),
    Map(Vec<(SnapValue, SnapValue)>),
    Set(Vec<SnapValue>),
    Error { name: String, message: String },
    Function(String),
    Symbol(String),
    /// Back-reference to an enclosing value, flattened at capture time
    Circular,
}

impl SnapValue {
    /// Decode a value from its JSON wire form
    pub fn from_json(json: Json) -> Result<Self, ValueError> {
        match json {
            Json::Null => Ok(Self::Null),
            Json::Bool(b) => Ok(Self::Bool(b)),
            Json::Number(n) => Ok(Self::Number(n.as_f64().unwrap_or(f64::NAN))),
            Json::String(s) => Ok(Self::String(s)),
            Json::Array(items) => Ok(Self::Array(
                items
                    .into_iter()
                    .map(Self::from_json)
                    .collect::<Result<_, _>>()?,
            )),
            Json::Object(mut map) => match map.remove(TAG_KEY) {
                Some(tag) => decode_tagged(tag, map.remove(PAYLOAD_KEY)),
                None => Ok(Self::Object(decode_fields(map)?)),
            },
        }
    }

    /// Encode into the JSON wire form
    pub fn to_json(&self) -> Json {
        match self {
            Self::Undefined => tagged("undefined", None),
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Number(n) => encode_number(*n),
            Self::BigInt(digits) => tagged("bigint", Some(Json::String(digits.clone()))),
            Self::String(s) => Json::String(s.clone()),
            Self::Date(iso) => tagged("date", Some(Json::String(iso.clone()))),
            Self::RegExp { source, flags } => tagged(
                "regexp",
                Some(serde_json::json!({ "source": source, "flags": flags })),
            ),
            Self::Array(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(fields) => {
                let map: JsonMap<String, Json> = fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                if map.contains_key(TAG_KEY) {
                    tagged("object", Some(Json::Object(map)))
                } else {
                    Json::Object(map)
                }
            }
            Self::Map(entries) => tagged(
                "map",
                Some(Json::Array(
                    entries
                        .iter()
                        .map(|(k, v)| Json::Array(vec![k.to_json(), v.to_json()]))
                        .collect(),
                )),
            ),
            Self::Set(items) => tagged(
                "set",
                Some(Json::Array(items.iter().map(Self::to_json).collect())),
            ),
            Self::Error { name, message } => tagged(
                "error",
                Some(serde_json::json!({ "name": name, "message": message })),
            ),
            Self::Function(name) => tagged("function", Some(Json::String(name.clone()))),
            Self::Symbol(desc) => tagged("symbol", Some(Json::String(desc.clone()))),
            Self::Circular => tagged("circular", None),
        }
    }

    /// Parse a value from encoded text
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Encode to compact text
    pub fn to_text(&self) -> String {
        self.to_json().to_string()
    }

    /// Stable text used to key map entries when comparing maps
    pub fn canonical_key(&self) -> String {
        self.to_text()
    }

    /// Short name of the value's shape, used in reports
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::String(_) => "string",
            Self::Date(_) => "Date",
            Self::RegExp { .. } => "RegExp",
            Self::Array(_) => "Array",
            Self::Object(_) => "Object",
            Self::Map(_) => "Map",
            Self::Set(_) => "Set",
            Self::Error { .. } => "Error",
            Self::Function(_) => "function",
            Self::Symbol(_) => "symbol",
            Self::Circular => "[Circular]",
        }
    }
}

impl TryFrom<Json> for SnapValue {
    type Error = ValueError;

    fn try_from(json: Json) -> Result<Self, ValueError> {
        Self::from_json(json)
    }
}

impl From<SnapValue> for Json {
    fn from(value: SnapValue) -> Self {
        value.to_json()
    }
}

impl From<f64> for SnapValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for SnapValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for SnapValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<bool> for SnapValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// JavaScript-flavoured rendering for terminal reports
impl fmt::Display for SnapValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::BigInt(digits) => write!(f, "{}n", digits),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Date(iso) => write!(f, "Date({})", iso),
            Self::RegExp { source, flags } => write!(f, "/{}/{}", source, flags),
            Self::Array(items) => write_seq(f, "[", items.iter(), "]"),
            Self::Set(items) => write_seq(f, "Set {", items.iter(), "}"),
            Self::Object(fields) => {
                write!(f, "{{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {}: {}", k, v)?;
                }
                if fields.is_empty() {
                    write!(f, "}}")
                } else {
                    write!(f, " }}")
                }
            }
            Self::Map(entries) => {
                write!(f, "Map {{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, " {} => {}", k, v)?;
                }
                write!(f, " }}")
            }
            Self::Error { name, message } => write!(f, "{}: {}", name, message),
            Self::Function(name) => write!(f, "[Function: {}]", name),
            Self::Symbol(desc) => write!(f, "Symbol({})", desc),
            Self::Circular => write!(f, "[Circular]"),
        }
    }
}

fn write_seq<'a>(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    items: impl Iterator<Item = &'a SnapValue>,
    close: &str,
) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "{}", close)
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn tagged(tag: &str, payload: Option<Json>) -> Json {
    let mut map = JsonMap::new();
    map.insert(TAG_KEY.to_string(), Json::String(tag.to_string()));
    if let Some(payload) = payload {
        map.insert(PAYLOAD_KEY.to_string(), payload);
    }
    Json::Object(map)
}

fn encode_number(n: f64) -> Json {
    if n.is_nan() {
        return tagged("number", Some(Json::String("NaN".to_string())));
    }
    if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        return tagged("number", Some(Json::String(text.to_string())));
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        return Json::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map_or(Json::Null, Json::Number)
}

fn decode_fields(map: JsonMap<String, Json>) -> Result<BTreeMap<String, SnapValue>, ValueError> {
    map.into_iter()
        .map(|(k, v)| Ok((k, SnapValue::from_json(v)?)))
        .collect()
}

fn decode_tagged(tag: Json, payload: Option<Json>) -> Result<SnapValue, ValueError> {
    let Json::String(tag) = tag else {
        return Err(ValueError::Malformed {
            tag: TAG_KEY.to_string(),
            reason: "tag must be a string".to_string(),
        });
    };

    let malformed = |reason: &str| ValueError::Malformed {
        tag: tag.clone(),
        reason: reason.to_string(),
    };

    match tag.as_str() {
        "undefined" => Ok(SnapValue::Undefined),
        "circular" => Ok(SnapValue::Circular),
        "number" => match payload.as_ref().and_then(Json::as_str) {
            Some("NaN") => Ok(SnapValue::Number(f64::NAN)),
            Some("Infinity") => Ok(SnapValue::Number(f64::INFINITY)),
            Some("-Infinity") => Ok(SnapValue::Number(f64::NEG_INFINITY)),
            _ => Err(malformed("expected NaN, Infinity or -Infinity")),
        },
        "bigint" | "date" | "function" | "symbol" => {
            let Some(Json::String(text)) = payload else {
                return Err(malformed("expected a string payload"));
            };
            Ok(match tag.as_str() {
                "bigint" => SnapValue::BigInt(text),
                "date" => SnapValue::Date(text),
                "function" => SnapValue::Function(text),
                _ => SnapValue::Symbol(text),
            })
        }
        "regexp" => {
            let source = string_field(payload.as_ref(), "source")
                .ok_or_else(|| malformed("missing source"))?;
            let flags = string_field(payload.as_ref(), "flags").unwrap_or_default();
            Ok(SnapValue::RegExp { source, flags })
        }
        "error" => {
            let name = string_field(payload.as_ref(), "name").unwrap_or_else(|| "Error".into());
            let message = string_field(payload.as_ref(), "message").unwrap_or_default();
            Ok(SnapValue::Error { name, message })
        }
        "set" => match payload {
            Some(Json::Array(items)) => Ok(SnapValue::Set(
                items
                    .into_iter()
                    .map(SnapValue::from_json)
                    .collect::<Result<_, _>>()?,
            )),
            _ => Err(malformed("expected an array payload")),
        },
        "map" => {
            let Some(Json::Array(entries)) = payload else {
                return Err(malformed("expected an array of entries"));
            };
            let mut decoded = Vec::with_capacity(entries.len());
            for entry in entries {
                let Json::Array(mut pair) = entry else {
                    return Err(malformed("entry must be a [key, value] pair"));
                };
                if pair.len() != 2 {
                    return Err(malformed("entry must be a [key, value] pair"));
                }
                let value = pair.pop().unwrap_or(Json::Null);
                let key = pair.pop().unwrap_or(Json::Null);
                decoded.push((SnapValue::from_json(key)?, SnapValue::from_json(value)?));
            }
            Ok(SnapValue::Map(decoded))
        }
        "object" => match payload {
            Some(Json::Object(map)) => Ok(SnapValue::Object(decode_fields(map)?)),
            _ => Err(malformed("expected an object payload")),
        },
        _ => Err(ValueError::UnknownTag(tag)),
    }
}

fn string_field(payload: Option<&Json>, field: &str) -> Option<String> {
    payload?.get(field)?.as_str().map(str::to_string)
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
