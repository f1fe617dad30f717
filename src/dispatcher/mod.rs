//! # Dispatcher Module
//!
//! Drives one request through the fixed pipeline:
//!
//! ```text
//! match path -> check params -> check query -> check payload
//!     -> invoke handler -> check output -> respond
//! ```
//!
//! Each stage either advances the request or short-circuits into an
//! [`Envelope::Error`](crate::dispatcher::Envelope) carrying the canonical
//! error for that stage. Handlers run as `may` coroutines fed over channels;
//! a per-request reply channel carries the result back. Handler panics are
//! caught and surface as generic internal errors, never as a crashed worker.

mod core;

pub use core::{
    Dispatcher, Envelope, HandlerReply, HandlerRequest, HandlerSender,
};
