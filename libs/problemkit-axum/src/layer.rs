//! Middleware surfaces for the problem pipeline.
//!
//! Two layers exist: [`problem_middleware`] completes problem responses for
//! a single route (or group of routes), and [`catch_fault_middleware`] is
//! the process-wide last line of defense, including a panic boundary.
//!
//! A fault is completed exactly once. Handler errors returned as
//! `ProblemError`/`Problem` stash their problem in the response extensions;
//! whichever layer sees the stash first re-renders it with content
//! negotiation and strips the stash, so an outer layer passes the finished
//! response through untouched.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use futures_util::FutureExt as _;
use http::{HeaderMap, header};

use problemkit::Problem;

use crate::dispatch::Dispatcher;

/// Check whether a response already carries a problem content-type.
#[must_use]
pub fn is_problem_response(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| {
            ct.starts_with("application/problem+json") || ct.starts_with("application/problem+xml")
        })
}

/// Join all `Accept` header values into one negotiation input.
fn accept_header(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}

/// Re-render a response whose handler stashed a not-yet-dispatched problem.
///
/// The stashed extension is the marker that a fault was translated but not
/// yet negotiated; the re-rendered response no longer carries it, so a
/// second surface leaves the response alone. Successful responses and
/// responses without a stash pass through. The request path becomes the
/// problem's `instance` when the handler did not set one.
fn complete_response(
    dispatcher: &Dispatcher,
    accept: Option<&str>,
    path: &str,
    response: Response,
) -> Response {
    if response.status().is_success() {
        return response;
    }
    let Some(problem) = response.extensions().get::<Problem>() else {
        return response;
    };
    let mut problem = problem.clone();
    if problem.instance.is_none() {
        problem.instance = Some(path.to_owned());
    }
    dispatcher.response(accept, &problem)
}

/// Per-route surface: completes problem responses produced by handlers
/// inside this layer.
///
/// Apply with `axum::middleware::from_fn_with_state(dispatcher, problem_middleware)`.
pub async fn problem_middleware(
    State(dispatcher): State<Arc<Dispatcher>>,
    request: Request,
    next: Next,
) -> Response {
    let accept = accept_header(request.headers());
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;
    complete_response(&dispatcher, accept.as_deref(), &path, response)
}

/// Fault synthesized from a panic crossing the catch-all boundary.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct PanicFault {
    message: String,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "request handler panicked".to_owned()
    }
}

/// Process-wide surface: the last line of defense.
///
/// Consults the dispatcher's handled-response predicate first; anything it
/// claims is left alone. Otherwise this behaves exactly like the per-route
/// surface, and additionally converts a panic unwinding out of the inner
/// service into a translated 500 problem response.
///
/// Apply outermost, with
/// `axum::middleware::from_fn_with_state(dispatcher, catch_fault_middleware)`.
pub async fn catch_fault_middleware(
    State(dispatcher): State<Arc<Dispatcher>>,
    request: Request,
    next: Next,
) -> Response {
    let accept = accept_header(request.headers());
    let path = request.uri().path().to_owned();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => {
            if dispatcher.is_handled(&response) {
                return response;
            }
            complete_response(&dispatcher, accept.as_deref(), &path, response)
        }
        Err(payload) => {
            let fault = PanicFault {
                message: panic_message(payload.as_ref()),
            };
            tracing::error!(panic = %fault, path = %path, "panic reached the fault boundary");
            dispatcher.respond_to_error(accept.as_deref(), &fault, Some(&path))
        }
    }
}
