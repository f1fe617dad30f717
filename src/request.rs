//! Raw request representation handed to the dispatcher by the transport.

use http::Method;
use serde_json::Value;
use std::borrow::Cow;

/// Untyped request as it arrives from the transport collaborator.
///
/// Query values distinguish "key present without a value" (`None`) from
/// "present but empty" (`Some("")`); both differ from an absent key. The
/// payload, when present, is already-decoded structured data — reading and
/// framing the body is the transport's job.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRequest {
    pub method: Method,
    /// Concrete request path, percent-decoded, without the query string.
    pub path: String,
    /// Raw query key/value pairs in wire order.
    pub query: Vec<(String, Option<String>)>,
    pub payload: Option<Value>,
}

impl RawRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            payload: None,
        }
    }

    /// Build from a request target like `/users?skip=0&limit=10`, splitting
    /// off and decoding the query string.
    #[must_use]
    pub fn from_target(method: Method, target: &str, payload: Option<Value>) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query_str)) => (path, parse_query(query_str)),
            None => (target, Vec::new()),
        };
        Self {
            method,
            path: path.to_string(),
            query,
            payload,
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Parse a query string into decoded key/value pairs.
///
/// `a=1&b=&c` yields `[("a", Some("1")), ("b", Some("")), ("c", None)]`.
#[must_use]
pub fn parse_query(query_str: &str) -> Vec<(String, Option<String>)> {
    query_str
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode_component(key), Some(decode_component(value))),
            None => (decode_component(pair), None),
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    // Invalid percent-escapes are kept verbatim; the shape parser will
    // reject the text if the declared shape cannot accept it.
    urlencoding::decode(&spaced)
        .map(Cow::into_owned)
        .unwrap_or(spaced)
}
