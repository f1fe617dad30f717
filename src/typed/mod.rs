//! Typed handler layer over the channel-based dispatcher.
//!
//! Lets business logic work with concrete request/response types instead of
//! raw JSON trees: the [`Handler`] trait converts the checked
//! [`HandlerRequest`](crate::dispatcher::HandlerRequest) into an associated
//! request type via `TryFrom` and serializes the typed response back to JSON.
//! Conversion runs after the shape checker, so a failed conversion is a
//! contract bug, not client error, and surfaces as an internal failure.

mod core;

pub use core::{spawn_typed, Handler, TypedHandlerRequest};
