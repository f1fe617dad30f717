//! # Shape Module
//!
//! Structural type descriptions ("shapes") and the two-phase checker that
//! turns raw wire input into validated, typed values.
//!
//! ## Overview
//!
//! A [`Shape`] describes the expected structure of a value: primitive kinds
//! (string, 64-bit integer, boolean), an optional wrapper, ordered sequences,
//! and fixed records of named fields. The same shape drives both inbound
//! checking (params, query, payload) and outbound checking (handler output).
//!
//! ## Two phases
//!
//! Each input channel moves through a small state machine,
//! `RAW -> PARSED -> VALIDATED`, with each transition independently failable:
//!
//! 1. **Parse** ([`parse`]) coerces the raw representation into the shape's
//!    typed value space. Path and query input arrives as strings; payload
//!    arrives as structured JSON and only needs a structural walk. A type
//!    mismatch, an unparsable number, or a field the shape does not declare
//!    all fail here.
//! 2. **Validate** ([`validate`]) applies declared domain constraints to the
//!    already-typed tree: required-field presence, integer ranges, string
//!    length and pattern. Validation is idempotent: a tree that passed once
//!    passes again.
//!
//! The split lets a client distinguish "you sent the wrong shape" from "you
//! sent the right shape but an out-of-range value" — remediation differs.
//!
//! ## Wire encoding
//!
//! JSON numbers lose precision past 2^53 in JavaScript clients, so [`wire`]
//! string-encodes 64-bit integers outside that range on the way out and the
//! parse phase accepts both encodings on the way in.

mod core;
pub mod parse;
pub mod validate;
pub mod wire;

pub use core::{Field, IntegerRules, Shape, StringRules};
pub use parse::ParseError;
pub use validate::ValidateError;

use crate::error::{ApiError, InputChannel};

/// Failure from either phase of the checker.
///
/// Carries which transition failed rather than a single generic "invalid"
/// error, so callers can map it onto the per-channel error kinds.
#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validate(#[from] ValidateError),
}

impl ShapeError {
    /// Convert into the canonical error for the channel the input came from.
    #[must_use]
    pub fn into_api_error(self, channel: InputChannel) -> ApiError {
        match self {
            ShapeError::Parse(err) => ApiError::new(
                channel.parse_kind(),
                format!("error parsing {}: {err}", channel.noun()),
            ),
            ShapeError::Validate(err) => ApiError::new(
                channel.validate_kind(),
                format!("error validating {}: {err}", channel.noun()),
            ),
        }
    }
}

/// Run both phases against structured input and return the typed value.
pub fn check_value(
    shape: &Shape,
    raw: &serde_json::Value,
) -> Result<serde_json::Value, ShapeError> {
    let parsed = parse::parse_value(shape, raw)?;
    validate::validate(shape, &parsed)?;
    Ok(parsed)
}

/// Run both phases against string input (path or query parameters).
///
/// `pairs` holds raw key/value entries; a `None` value means the key was
/// present without a value, which is distinct from an empty string.
pub fn check_str_fields<'a, I>(shape: &Shape, pairs: I) -> Result<serde_json::Value, ShapeError>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let parsed = parse::parse_str_fields(shape, pairs)?;
    validate::validate(shape, &parsed)?;
    Ok(parsed)
}
