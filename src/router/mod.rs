//! # Router Module
//!
//! Path matching and route resolution against the schema registry.
//!
//! ## Overview
//!
//! The matcher is responsible for:
//! - Finding, among a method's registered routes, the one whose segments
//!   match an incoming request path position-for-position
//! - Binding named placeholder segments (`:id`) to their raw string values
//! - Returning the matched route's contract for downstream validation
//!
//! ## Determinism
//!
//! Ambiguous pattern pairs are rejected at registration time, so at most one
//! route can match any concrete path and the matcher is a pure, first-match
//! linear scan over the method's routes. No match is not an error here — the
//! dispatcher maps it to `RESOURCE_NOT_FOUND`.

mod core;

pub use core::{Matcher, ParamVec, RouteMatch, MAX_INLINE_PARAMS};
