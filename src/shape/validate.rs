//! Validate phase: domain constraints over an already-typed value tree.
//!
//! Runs after a successful parse, so the tree is structurally sound; this
//! walk only checks the declared constraints — required-field presence,
//! integer ranges, string length and pattern. Validating a tree that already
//! passed is guaranteed to pass again.

use super::core::{IntegerRules, Shape, StringRules};
use serde_json::Value;
use std::fmt;

/// Constraint violation on a typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateError {
    /// Dotted path to the offending value, empty at the root.
    pub path: String,
    pub reason: String,
}

impl ValidateError {
    fn at(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "`{}`: {}", self.path, self.reason)
        }
    }
}

impl std::error::Error for ValidateError {}

/// Check every declared constraint of `shape` against `value`.
pub fn validate(shape: &Shape, value: &Value) -> Result<(), ValidateError> {
    validate_at(shape, value, "")
}

fn validate_at(shape: &Shape, value: &Value, path: &str) -> Result<(), ValidateError> {
    if let Shape::Optional(inner) = shape {
        return if value.is_null() {
            Ok(())
        } else {
            validate_at(inner, value, path)
        };
    }

    if value.is_null() {
        return Err(ValidateError::at(path, "value is required"));
    }

    match shape {
        Shape::Optional(_) => Ok(()),
        Shape::String(rules) => match value.as_str() {
            Some(s) => validate_string(rules, s, path),
            None => Err(ValidateError::at(path, "expected a string value")),
        },
        Shape::Integer(rules) => match value.as_i64() {
            Some(n) => validate_integer(rules, n, path),
            None => Err(ValidateError::at(path, "expected a 64-bit integer value")),
        },
        Shape::Boolean => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err(ValidateError::at(path, "expected a boolean value"))
            }
        }
        Shape::Sequence(item) => match value.as_array() {
            Some(items) => {
                for (idx, entry) in items.iter().enumerate() {
                    validate_at(item, entry, &format!("{path}[{idx}]"))?;
                }
                Ok(())
            }
            None => Err(ValidateError::at(path, "expected a sequence value")),
        },
        Shape::Record(fields) => match value.as_object() {
            Some(map) => {
                for field in fields {
                    let field_path = if path.is_empty() {
                        field.name.clone()
                    } else {
                        format!("{path}.{}", field.name)
                    };
                    let member = map.get(&field.name).unwrap_or(&Value::Null);
                    validate_at(&field.shape, member, &field_path)?;
                }
                Ok(())
            }
            None => Err(ValidateError::at(path, "expected a record value")),
        },
    }
}

fn validate_string(rules: &StringRules, s: &str, path: &str) -> Result<(), ValidateError> {
    let len = s.chars().count();
    if let Some(min) = rules.min_len {
        if len < min {
            return Err(ValidateError::at(
                path,
                format!("length {len} is below the minimum of {min}"),
            ));
        }
    }
    if let Some(max) = rules.max_len {
        if len > max {
            return Err(ValidateError::at(
                path,
                format!("length {len} exceeds the maximum of {max}"),
            ));
        }
    }
    if let Some(pattern) = &rules.pattern {
        if !pattern.is_match(s) {
            return Err(ValidateError::at(
                path,
                format!("value does not match pattern `{pattern}`"),
            ));
        }
    }
    Ok(())
}

fn validate_integer(rules: &IntegerRules, n: i64, path: &str) -> Result<(), ValidateError> {
    if let Some(min) = rules.min {
        if n < min {
            return Err(ValidateError::at(path, format!("{n} is below the minimum of {min}")));
        }
    }
    if let Some(max) = rules.max {
        if n > max {
            return Err(ValidateError::at(path, format!("{n} exceeds the maximum of {max}")));
        }
    }
    Ok(())
}
