//! # wireshape
//!
//! **wireshape** is a typed API contract core: routes, their input and output
//! shapes, and a coroutine-powered dispatcher that enforces the contract on
//! every request before and after business logic runs.
//!
//! ## Overview
//!
//! A service declares its routes once, in code, as a catalog of path patterns
//! with shapes for path parameters, query parameters, payload, and output.
//! The dispatcher then drives each request through a fixed pipeline and turns
//! every failure into one of nine canonical error kinds with a fixed HTTP
//! status, so clients can switch on the tag instead of parsing message text.
//!
//! ## Architecture
//!
//! - **[`shape`]** - Structural type descriptions and the two-phase
//!   parse/validate checker
//! - **[`registry`]** - Route catalog with registration-time ambiguity
//!   rejection
//! - **[`router`]** - Deterministic first-match path matching with `:name`
//!   placeholders
//! - **[`dispatcher`]** - Coroutine-based handler dispatch over `may`
//!   channels
//! - **[`typed`]** - Type-safe handler traits over the checked request data
//! - **[`error`]** - The closed error taxonomy and wire envelope
//! - **[`request`]** - The raw request type handed over by the transport
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use http::Method;
//! use serde_json::json;
//! use wireshape::dispatcher::Dispatcher;
//! use wireshape::registry::{Registry, Route};
//! use wireshape::request::RawRequest;
//! use wireshape::shape::{Field, Shape};
//!
//! let user = Shape::record([
//!     Field::new("id", Shape::string()),
//!     Field::new("email", Shape::string()),
//! ]);
//!
//! let mut registry = Registry::new();
//! registry
//!     .register(
//!         Route::new(Method::GET, "/users/:id", "get_user", user)
//!             .params(Shape::record([Field::new("id", Shape::string())])),
//!     )
//!     .expect("route");
//!
//! let mut dispatcher = Dispatcher::new(Arc::new(registry));
//! unsafe {
//!     dispatcher.register_handler("get_user", |req| {
//!         let id = req.param("id").cloned().unwrap_or_default();
//!         Ok(json!({ "id": id, "email": "user@example.com" }))
//!     });
//! }
//!
//! let envelope = dispatcher.dispatch(RawRequest::from_target(
//!     Method::GET,
//!     "/users/abc123",
//!     None,
//! ));
//! assert_eq!(envelope.status(), 200);
//! ```

pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod registry;
pub mod request;
pub mod router;
pub mod runtime_config;
pub mod shape;
pub mod typed;

pub use dispatcher::{Dispatcher, Envelope, HandlerRequest};
pub use error::{ApiError, ErrorKind, ErrorPayload, HandlerError};
pub use registry::{Registry, RegistryError, Route};
pub use request::RawRequest;
pub use router::{Matcher, RouteMatch};
pub use runtime_config::RuntimeConfig;
pub use shape::{Field, IntegerRules, Shape, StringRules};
