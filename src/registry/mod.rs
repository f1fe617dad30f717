//! # Registry Module
//!
//! The schema registry is the single source of truth for the API contract:
//! one entry per route, holding the method, the path pattern, and the
//! declared shapes for path params, query params, payload, and output.
//!
//! ## Overview
//!
//! Routes are declared in code as [`Route`] values and registered once at
//! startup. Registration is the only place contract-level mistakes can enter
//! the system, so all of them are rejected here rather than resolved at match
//! time: duplicate (method, pattern) pairs, repeated placeholder names within
//! one pattern, and pattern pairs a request path could match ambiguously.
//!
//! After startup the registry is read-only; matched routes are handed out as
//! `Arc<RouteSpec>` and are safe for unsynchronized concurrent reads.
//!
//! Client-facing typed bindings are generated from the registry's contents by
//! an external offline step; the iteration order of [`Registry::routes`] is
//! registration order so that regeneration is deterministic.

mod core;

pub use core::{Registry, RegistryError, Route, RouteSpec, Segment};
