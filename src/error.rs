//! Canonical error taxonomy and the wire-level error envelope.
//!
//! Every failure that crosses the request boundary is converted into an
//! [`ApiError`] carrying one of the nine [`ErrorKind`] tags. The set is closed:
//! adding a kind is a contract version bump, because generated client bindings
//! switch on the tag.

use serde::{Deserialize, Serialize};

/// Closed set of failure kinds exposed to clients.
///
/// Serialized in SCREAMING_SNAKE_CASE under the `kind` discriminator so that
/// clients can handle errors by tag instead of matching on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Unexpected failure inside a handler or the dispatcher itself.
    Internal,
    /// No registered route matches the request method and path.
    ResourceNotFound,
    /// The route matched but the referenced entity does not exist.
    /// Raised by handlers, never by the dispatcher.
    RecordNotFound,
    InvalidParamsParse,
    InvalidParamsValidate,
    InvalidQueryParse,
    InvalidQueryValidate,
    InvalidPayloadParse,
    InvalidPayloadValidate,
}

impl ErrorKind {
    /// HTTP status code fixed per kind.
    #[must_use]
    pub fn status(self) -> u16 {
        match self {
            ErrorKind::Internal => 500,
            ErrorKind::ResourceNotFound | ErrorKind::RecordNotFound => 404,
            ErrorKind::InvalidParamsParse
            | ErrorKind::InvalidParamsValidate
            | ErrorKind::InvalidQueryParse
            | ErrorKind::InvalidQueryValidate
            | ErrorKind::InvalidPayloadParse
            | ErrorKind::InvalidPayloadValidate => 400,
        }
    }
}

/// Input channel a shape failure originated from.
///
/// Parse and validate failures map to distinct [`ErrorKind`]s per channel so a
/// client can tell "wrong shape" apart from "right shape, bad value".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputChannel {
    Params,
    Query,
    Payload,
}

impl InputChannel {
    #[must_use]
    pub fn parse_kind(self) -> ErrorKind {
        match self {
            InputChannel::Params => ErrorKind::InvalidParamsParse,
            InputChannel::Query => ErrorKind::InvalidQueryParse,
            InputChannel::Payload => ErrorKind::InvalidPayloadParse,
        }
    }

    #[must_use]
    pub fn validate_kind(self) -> ErrorKind {
        match self {
            InputChannel::Params => ErrorKind::InvalidParamsValidate,
            InputChannel::Query => ErrorKind::InvalidQueryValidate,
            InputChannel::Payload => ErrorKind::InvalidPayloadValidate,
        }
    }

    /// Noun used in error message prefixes ("error parsing path parameters: ...").
    #[must_use]
    pub fn noun(self) -> &'static str {
        match self {
            InputChannel::Params => "path parameters",
            InputChannel::Query => "query parameters",
            InputChannel::Payload => "payload",
        }
    }
}

/// Canonical error value returned to clients.
///
/// Never constructed field-by-field outside this module; [`ApiError::new`]
/// fixes the status from the kind so the pair can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("api error: status = {status}, kind = {kind:?}, message = {message}")]
pub struct ApiError {
    pub status: u16,
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    /// Build an error with the status code fixed by its kind.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: kind.status(),
            kind,
            message: message.into(),
        }
    }

    /// Generic internal error that does not leak failure detail to the client.
    /// The original detail is expected to be logged at the failure site.
    #[must_use]
    pub fn internal() -> Self {
        Self::new(ErrorKind::Internal, "internal error")
    }
}

/// Uniform wrapper for the outbound error body:
/// `{ "error": { "status": <int>, "message": <string>, "kind": <tag> } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: ApiError,
}

impl From<ApiError> for ErrorPayload {
    fn from(error: ApiError) -> Self {
        Self { error }
    }
}

/// Failure reported by business-logic handlers.
///
/// Handlers must tag their failures explicitly; anything that is not a
/// missing record is treated as internal and its detail kept out of the
/// response payload.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Route matched, entity absent. The message is client-safe.
    #[error("record not found: {0}")]
    RecordNotFound(String),
    /// Unexpected handler failure. The message is logged, not exposed.
    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn record_not_found(message: impl Into<String>) -> Self {
        HandlerError::RecordNotFound(message.into())
    }

    pub fn internal(detail: impl std::fmt::Display) -> Self {
        HandlerError::Internal(detail.to_string())
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        HandlerError::Internal(format!("{err:#}"))
    }
}
