use crate::dispatcher::{Dispatcher, HandlerReply, HandlerRequest, HandlerSender};
use crate::error::HandlerError;
use http::Method;
use may::coroutine;
use may::sync::mpsc;
use serde::Serialize;
use std::convert::TryFrom;
use tracing::{debug, error, info, warn};

/// Trait implemented by typed coroutine handlers.
///
/// The associated `Request` type is built from the already-checked
/// [`HandlerRequest`] with `TryFrom`; the associated `Response` is serialized
/// to JSON and then output-checked by the dispatcher like any other handler
/// result.
pub trait Handler: Send + 'static {
    /// Typed request, converted from the checked [`HandlerRequest`].
    type Request: TryFrom<HandlerRequest, Error = anyhow::Error> + Send + 'static;
    /// Typed response, serialized to JSON.
    type Response: Serialize + Send + 'static;

    fn handle(&self, req: TypedHandlerRequest<Self::Request>) -> Result<Self::Response, HandlerError>;
}

/// Typed request data passed to a [`Handler`].
#[derive(Debug, Clone)]
pub struct TypedHandlerRequest<T> {
    pub method: Method,
    /// Concrete request path (not the route pattern).
    pub path: String,
    pub handler_name: String,
    /// Typed request data, converted from the checked inputs.
    pub data: T,
}

/// Spawn a typed handler coroutine and return the sender that feeds it.
///
/// The coroutine converts each incoming request into `H::Request`, runs the
/// handler, serializes the typed response, and sends the reply. Conversion
/// and serialization failures are reported as internal failures: the shape
/// checker already ran, so they indicate a mismatch between the route's
/// declared shapes and the handler's types. Panics are caught and reported
/// the same way.
///
/// # Safety
///
/// This function is marked unsafe because it calls
/// `may::coroutine::Builder::spawn()`, which is unsafe in the `may` runtime.
/// The caller must ensure the May runtime is properly initialized before
/// calling this.
pub unsafe fn spawn_typed<H>(handler: H, stack_size: usize) -> Option<HandlerSender>
where
    H: Handler + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<HandlerRequest>();

    // SAFETY: see function-level safety contract; the handler is
    // Send + 'static and all failures travel over the reply channel.
    let spawn_result = unsafe {
        coroutine::Builder::new()
            .stack_size(stack_size)
            .spawn(move || {
                for req in rx.iter() {
                    let reply_tx = req.reply_tx.clone();
                    let handler_name = req.handler_name.clone();
                    let request_id = req.request_id;

                    let result: Result<HandlerReply, _> =
                        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                            run_typed(&handler, req)
                        }));

                    match result {
                        Ok(reply) => {
                            let _ = reply_tx.send(reply);
                        }
                        Err(panic) => {
                            error!(
                                request_id = %request_id,
                                handler_name = %handler_name,
                                panic_message = ?panic,
                                "typed handler panicked"
                            );
                            let _ =
                                reply_tx.send(Err(HandlerError::internal("handler panicked")));
                        }
                    }
                }
            })
    };

    match spawn_result {
        Ok(_) => Some(tx),
        Err(e) => {
            error!(error = %e, stack_size = stack_size, "failed to spawn typed handler coroutine");
            None
        }
    }
}

fn run_typed<H>(handler: &H, req: HandlerRequest) -> HandlerReply
where
    H: Handler,
{
    let request_id = req.request_id;
    let handler_name = req.handler_name.clone();
    let method = req.method.clone();
    let path = req.path.clone();

    let data = match H::Request::try_from(req) {
        Ok(data) => data,
        Err(err) => {
            // Checked input that still fails conversion means the handler's
            // types disagree with the route's declared shapes.
            error!(
                request_id = %request_id,
                handler_name = %handler_name,
                error = %err,
                "typed request conversion failed"
            );
            return Err(HandlerError::internal("typed request conversion failed"));
        }
    };

    debug!(
        request_id = %request_id,
        handler_name = %handler_name,
        "typed handler execution start"
    );

    let response = handler.handle(TypedHandlerRequest {
        method,
        path,
        handler_name: handler_name.clone(),
        data,
    })?;

    match serde_json::to_value(response) {
        Ok(value) => Ok(value),
        Err(err) => {
            error!(
                request_id = %request_id,
                handler_name = %handler_name,
                error = %err,
                "typed response serialization failed"
            );
            Err(HandlerError::internal("typed response serialization failed"))
        }
    }
}

impl Dispatcher {
    /// Register a typed handler under the given name.
    ///
    /// # Safety
    ///
    /// Calls [`spawn_typed`]; the caller must uphold the same requirement
    /// that the May coroutine runtime is initialized.
    pub unsafe fn register_typed<H>(&mut self, name: &str, handler: H)
    where
        H: Handler + Send + 'static,
    {
        // SAFETY: forwarded from this function's own safety contract.
        let Some(tx) = (unsafe { spawn_typed(handler, self.stack_size()) }) else {
            return;
        };
        if self.handlers.insert(name.to_string(), tx).is_some() {
            warn!(
                handler_name = %name,
                "replaced existing handler - old coroutine will exit"
            );
        } else {
            info!(handler_name = %name, "typed handler registered");
        }
    }
}
