use crate::error::{ApiError, ErrorKind, ErrorPayload, HandlerError, InputChannel};
use crate::ids::RequestId;
use crate::registry::{Registry, RouteSpec};
use crate::request::RawRequest;
use crate::router::Matcher;
use crate::runtime_config::RuntimeConfig;
use crate::shape::{check_str_fields, check_value, wire};
use http::Method;
use may::coroutine;
use may::sync::mpsc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Result sent back from a handler coroutine: the output value on success,
/// a tagged failure otherwise.
pub type HandlerReply = Result<Value, HandlerError>;

/// Channel sender that feeds requests into one handler coroutine.
pub type HandlerSender = mpsc::Sender<HandlerRequest>;

/// Checked request data passed to a handler coroutine.
///
/// All three input channels have already been parsed and validated against
/// the route's declared shapes; a channel without a declared shape carries
/// `Value::Null`. Handlers never see raw wire text.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for log correlation.
    pub request_id: RequestId,
    pub method: Method,
    /// Concrete request path (not the route pattern).
    pub path: String,
    pub handler_name: String,
    /// Checked path parameters, keyed by placeholder name.
    pub params: Value,
    /// Checked query parameters.
    pub query: Value,
    /// Checked payload.
    pub payload: Value,
    /// Channel for sending the result back to the dispatcher.
    pub reply_tx: mpsc::Sender<HandlerReply>,
}

impl HandlerRequest {
    /// Get a checked path parameter by placeholder name.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Get a checked query parameter by name.
    #[inline]
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&Value> {
        self.query.get(name)
    }
}

/// Terminal result of dispatching one request.
///
/// Either the handler's (output-checked, wire-encoded) value with status 200,
/// or a canonical error whose status is fixed by its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Output(Value),
    Error(ApiError),
}

impl Envelope {
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Envelope::Output(_) => 200,
            Envelope::Error(err) => err.status,
        }
    }

    /// Response body ready for serialization. Errors are wrapped in the
    /// uniform `{ "error": { ... } }` envelope.
    #[must_use]
    pub fn into_json(self) -> Value {
        match self {
            Envelope::Output(value) => value,
            Envelope::Error(err) => serde_json::json!(ErrorPayload::from(err)),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Envelope::Error(_))
    }
}

/// Routes checked requests to registered handler coroutines.
///
/// Holds the route catalog, the matcher built over it, and a map of handler
/// names to their channel senders. The full pipeline for one request lives in
/// [`Dispatcher::dispatch`].
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    matcher: Matcher,
    pub(crate) handlers: HashMap<String, HandlerSender>,
    config: RuntimeConfig,
}

impl Dispatcher {
    /// Create a dispatcher over a fully populated registry, reading runtime
    /// configuration from the environment.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_config(registry, RuntimeConfig::from_env())
    }

    #[must_use]
    pub fn with_config(registry: Arc<Registry>, config: RuntimeConfig) -> Self {
        let matcher = Matcher::new(Arc::clone(&registry));
        Dispatcher {
            registry,
            matcher,
            handlers: HashMap::new(),
            config,
        }
    }

    /// The route catalog this dispatcher serves.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub(crate) fn stack_size(&self) -> usize {
        self.config.stack_size
    }

    /// Registers a handler function under the given name.
    ///
    /// Spawns a coroutine that processes requests from a channel. The handler
    /// is wrapped with panic recovery so one failing handler cannot take the
    /// process down; a panic surfaces to the client as a generic internal
    /// error.
    ///
    /// Registering a second handler under the same name replaces the first;
    /// the old sender is dropped, which closes its channel and lets the old
    /// coroutine exit.
    ///
    /// # Safety
    ///
    /// This function is marked unsafe because it calls
    /// `may::coroutine::Builder::spawn()`, which is unsafe in the `may`
    /// runtime. The unsafety comes from the coroutine runtime's requirements,
    /// not from this function's logic. The caller must ensure the May runtime
    /// is properly initialized before calling this.
    pub unsafe fn register_handler<F>(&mut self, name: &str, handler_fn: F)
    where
        F: Fn(&HandlerRequest) -> Result<Value, HandlerError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<HandlerRequest>();
        let name = name.to_string();
        let handler_name_for_logging = name.clone();
        let stack_size = self.config.stack_size;

        // SAFETY: may::coroutine::Builder::spawn() is marked unsafe by the may
        // runtime. The handler function is Send + 'static, so no references
        // can dangle; failures travel over the reply channel, not as panics.
        let spawn_result = unsafe {
            coroutine::Builder::new()
                .stack_size(stack_size)
                .spawn(move || {
                    debug!(
                        handler_name = %handler_name_for_logging,
                        stack_size = stack_size,
                        "handler coroutine start"
                    );

                    for req in rx.iter() {
                        let reply_tx = req.reply_tx.clone();
                        let handler_name = req.handler_name.clone();
                        let request_id = req.request_id;
                        let execution_start = Instant::now();

                        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                            handler_fn(&req)
                        })) {
                            Ok(result) => {
                                debug!(
                                    request_id = %request_id,
                                    handler_name = %handler_name,
                                    execution_time_ms =
                                        execution_start.elapsed().as_millis() as u64,
                                    ok = result.is_ok(),
                                    "handler execution complete"
                                );
                                let _ = reply_tx.send(result);
                            }
                            Err(panic) => {
                                error!(
                                    request_id = %request_id,
                                    handler_name = %handler_name,
                                    panic_message = ?panic,
                                    "handler panicked"
                                );
                                let _ = reply_tx
                                    .send(Err(HandlerError::internal("handler panicked")));
                            }
                        }
                    }
                })
        };

        if let Err(e) = spawn_result {
            error!(
                handler_name = %name,
                error = %e,
                stack_size = stack_size,
                "failed to spawn handler coroutine"
            );
            // Leave the handler unregistered rather than crash; requests to
            // it will surface as internal errors.
            return;
        }

        if self.handlers.insert(name.clone(), tx).is_some() {
            warn!(
                handler_name = %name,
                "replaced existing handler - old coroutine will exit"
            );
        } else {
            info!(
                handler_name = %name,
                total_handlers = self.handlers.len(),
                "handler registered"
            );
        }
    }

    /// Run one request through the full pipeline and produce its envelope.
    ///
    /// Stages run strictly in order and short-circuit on the first failure:
    /// route match, params check, query check, payload check, handler
    /// invocation, output check, wire encoding. Input channels the route does
    /// not declare a shape for are ignored entirely.
    #[must_use]
    pub fn dispatch(&self, raw: RawRequest) -> Envelope {
        let request_id = RequestId::new();
        let RawRequest {
            method,
            path,
            query,
            payload,
        } = raw;

        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            "dispatch start"
        );

        let Some(matched) = self.matcher.match_route(&method, &path) else {
            return Envelope::Error(ApiError::new(
                ErrorKind::ResourceNotFound,
                format!("no route for {method} {path}"),
            ));
        };
        let route = matched.route;

        let params = match &route.params {
            Some(shape) => {
                let pairs = matched
                    .path_params
                    .iter()
                    .map(|(k, v)| (k.as_ref(), Some(v.as_str())));
                match check_str_fields(shape, pairs) {
                    Ok(value) => value,
                    Err(err) => {
                        return Envelope::Error(err.into_api_error(InputChannel::Params))
                    }
                }
            }
            None => Value::Null,
        };

        let checked_query = match &route.query {
            Some(shape) => {
                let pairs = query.iter().map(|(k, v)| (k.as_str(), v.as_deref()));
                match check_str_fields(shape, pairs) {
                    Ok(value) => value,
                    Err(err) => return Envelope::Error(err.into_api_error(InputChannel::Query)),
                }
            }
            None => Value::Null,
        };

        let checked_payload = match &route.payload {
            Some(shape) => {
                // An absent body checks as null; a non-optional payload shape
                // rejects it in the parse phase.
                let body = payload.unwrap_or(Value::Null);
                match check_value(shape, &body) {
                    Ok(value) => value,
                    Err(err) => {
                        return Envelope::Error(err.into_api_error(InputChannel::Payload))
                    }
                }
            }
            None => Value::Null,
        };

        let output = match self.invoke(
            request_id,
            &route,
            method,
            path,
            params,
            checked_query,
            checked_payload,
        ) {
            Ok(value) => value,
            Err(err) => return Envelope::Error(err),
        };

        if self.config.validate_output {
            if let Err(err) = check_value(&route.output, &output) {
                error!(
                    request_id = %request_id,
                    handler_name = %route.handler_name,
                    error = %err,
                    "handler output failed the declared output shape"
                );
                return Envelope::Error(ApiError::new(
                    ErrorKind::Internal,
                    "response does not conform to declared output shape",
                ));
            }
        }

        Envelope::Output(wire::encode(output))
    }

    #[allow(clippy::too_many_arguments)]
    fn invoke(
        &self,
        request_id: RequestId,
        route: &Arc<RouteSpec>,
        method: Method,
        path: String,
        params: Value,
        query: Value,
        payload: Value,
    ) -> Result<Value, ApiError> {
        let Some(tx) = self.handlers.get(&route.handler_name) else {
            let available: Vec<&String> = self.handlers.keys().collect();
            error!(
                request_id = %request_id,
                handler_name = %route.handler_name,
                available_handlers = ?available,
                "handler not found"
            );
            return Err(ApiError::internal());
        };

        let (reply_tx, reply_rx) = mpsc::channel::<HandlerReply>();
        let request = HandlerRequest {
            request_id,
            method,
            path,
            handler_name: route.handler_name.clone(),
            params,
            query,
            payload,
            reply_tx,
        };

        debug!(
            request_id = %request_id,
            handler_name = %request.handler_name,
            "request dispatched to handler"
        );
        let start = Instant::now();

        if let Err(e) = tx.send(request) {
            error!(
                request_id = %request_id,
                handler_name = %route.handler_name,
                error = %e,
                "failed to send request to handler"
            );
            return Err(ApiError::internal());
        }

        match reply_rx.recv() {
            Ok(Ok(output)) => {
                info!(
                    request_id = %request_id,
                    handler_name = %route.handler_name,
                    latency_ms = start.elapsed().as_millis() as u64,
                    "handler reply received"
                );
                Ok(output)
            }
            Ok(Err(HandlerError::RecordNotFound(message))) => {
                info!(
                    request_id = %request_id,
                    handler_name = %route.handler_name,
                    message = %message,
                    "handler reported record not found"
                );
                Err(ApiError::new(ErrorKind::RecordNotFound, message))
            }
            Ok(Err(HandlerError::Internal(detail))) => {
                // Detail stays in the log; the client gets the generic form.
                error!(
                    request_id = %request_id,
                    handler_name = %route.handler_name,
                    detail = %detail,
                    "handler failed"
                );
                Err(ApiError::internal())
            }
            Err(e) => {
                error!(
                    request_id = %request_id,
                    handler_name = %route.handler_name,
                    error = %e,
                    "handler channel closed before replying"
                );
                Err(ApiError::internal())
            }
        }
    }
}
