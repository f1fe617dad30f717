//! Parse phase: coerce raw input into a shape's typed value space.
//!
//! Path and query input arrives as flat string maps; payload input arrives as
//! structured JSON. Either way the output is a normalized `serde_json::Value`
//! tree in which integers are real JSON numbers, absent optional fields are
//! explicit nulls, and every member the shape does not declare has been
//! rejected. Domain constraints are not looked at here; that is the validate
//! phase's job.

use super::core::{Field, Shape};
use serde_json::{Map, Value};
use std::fmt;

/// Structural mismatch between raw input and the declared shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Dotted path to the offending value, empty at the root.
    pub path: String,
    pub reason: String,
}

impl ParseError {
    pub(crate) fn at(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "`{}`: {}", self.path, self.reason)
        }
    }
}

impl std::error::Error for ParseError {}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "record",
    }
}

/// Parse flat string input (path or query parameters) against a record shape.
///
/// A `None` value means the key appeared without a value; both that and a
/// missing key parse to null, while `Some("")` is a present empty string.
/// Duplicate keys use last-write-wins, unknown keys fail the parse.
pub fn parse_str_fields<'a, I>(shape: &Shape, pairs: I) -> Result<Value, ParseError>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let Shape::Record(fields) = shape else {
        return Err(ParseError::at(
            "",
            "string input can only be parsed against a record shape",
        ));
    };

    let provided: Vec<(&str, Option<&str>)> = pairs.into_iter().collect();

    for (key, _) in &provided {
        if !fields.iter().any(|f| f.name == *key) {
            return Err(ParseError::at(*key, "unexpected field"));
        }
    }

    let mut out = Map::with_capacity(fields.len());
    for field in fields {
        let raw = provided
            .iter()
            .rfind(|(k, _)| *k == field.name)
            .map(|(_, v)| *v);
        let value = match raw.flatten() {
            None => Value::Null,
            Some(s) => parse_scalar(&field.shape, s, &field.name)?,
        };
        out.insert(field.name.clone(), value);
    }
    Ok(Value::Object(out))
}

fn parse_scalar(shape: &Shape, raw: &str, path: &str) -> Result<Value, ParseError> {
    match shape {
        Shape::Optional(inner) => parse_scalar(inner, raw, path),
        Shape::String(_) => Ok(Value::String(raw.to_string())),
        Shape::Integer(_) => raw.parse::<i64>().map(Value::from).map_err(|_| {
            ParseError::at(path, format!("`{raw}` is not a base-10 64-bit integer"))
        }),
        Shape::Boolean => match raw {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            other => Err(ParseError::at(
                path,
                format!("`{other}` is not `true` or `false`"),
            )),
        },
        Shape::Sequence(_) | Shape::Record(_) => Err(ParseError::at(
            path,
            format!(
                "{} values cannot be carried in path or query input",
                shape.kind_name()
            ),
        )),
    }
}

/// Parse structured input (payload or handler output) against a shape.
///
/// Returns a normalized copy of the tree: string-encoded 64-bit integers
/// become numbers and missing optional record members become explicit nulls.
pub fn parse_value(shape: &Shape, raw: &Value) -> Result<Value, ParseError> {
    parse_value_at(shape, raw, "")
}

fn parse_value_at(shape: &Shape, raw: &Value, path: &str) -> Result<Value, ParseError> {
    match shape {
        Shape::Optional(inner) => {
            if raw.is_null() {
                Ok(Value::Null)
            } else {
                parse_value_at(inner, raw, path)
            }
        }
        Shape::String(_) => match raw {
            Value::String(s) => Ok(Value::String(s.clone())),
            other => Err(mismatch(shape, other, path)),
        },
        Shape::Integer(_) => match raw {
            Value::Number(n) => n
                .as_i64()
                .map(Value::from)
                .ok_or_else(|| ParseError::at(path, "number is not a 64-bit integer")),
            // Wire rule: integers past 2^53-1 travel as strings.
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| mismatch(shape, raw, path)),
            other => Err(mismatch(shape, other, path)),
        },
        Shape::Boolean => match raw {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            other => Err(mismatch(shape, other, path)),
        },
        Shape::Sequence(item) => match raw {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (idx, entry) in items.iter().enumerate() {
                    out.push(parse_value_at(item, entry, &format!("{path}[{idx}]"))?);
                }
                Ok(Value::Array(out))
            }
            other => Err(mismatch(shape, other, path)),
        },
        Shape::Record(fields) => match raw {
            Value::Object(map) => parse_record(fields, map, path),
            other => Err(mismatch(shape, other, path)),
        },
    }
}

fn parse_record(
    fields: &[Field],
    map: &Map<String, Value>,
    path: &str,
) -> Result<Value, ParseError> {
    for key in map.keys() {
        if !fields.iter().any(|f| &f.name == key) {
            return Err(ParseError::at(child_path(path, key), "unexpected field"));
        }
    }

    let mut out = Map::with_capacity(fields.len());
    for field in fields {
        let field_path = child_path(path, &field.name);
        let value = match map.get(&field.name) {
            None | Some(Value::Null) => Value::Null,
            Some(raw) => parse_value_at(&field.shape, raw, &field_path)?,
        };
        out.insert(field.name.clone(), value);
    }
    Ok(Value::Object(out))
}

fn mismatch(shape: &Shape, raw: &Value, path: &str) -> ParseError {
    ParseError::at(
        path,
        format!("expected {}, found {}", shape.kind_name(), json_kind(raw)),
    )
}
