//! The dispatcher: negotiate, serialize, and shape a problem response.
//!
//! Both response shapes (a direct [`Response`] and the handler-friendly
//! [`ProblemResponse`]) are thin adapters over one [`Dispatcher::render`]
//! computation, so status, content-type, and body can never diverge between
//! them.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::{StatusCode, header};

use problemkit::{FormatterRegistry, Problem, ProblemFormat, Translator, negotiate};

/// Framework-supplied predicate: has this response already been dealt with
/// upstream? Responses it accepts are left untouched by the catch-all layer.
pub type HandledPredicate = Arc<dyn Fn(&Response) -> bool + Send + Sync>;

/// The fully computed wire form of a problem response.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub status: StatusCode,
    pub content_type: &'static str,
    pub body: Bytes,
}

impl IntoResponse for Rendered {
    fn into_response(self) -> Response {
        let mut resp = (self.status, self.body).into_response();
        resp.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(self.content_type),
        );
        resp
    }
}

/// Result-object adapter: a rendered problem usable as a handler return
/// value. Carries exactly the bytes the direct response adapter would emit.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ProblemResponse(Rendered);

impl ProblemResponse {
    /// The underlying rendered form.
    #[must_use]
    pub fn rendered(&self) -> &Rendered {
        &self.0
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        self.0.into_response()
    }
}

/// Translates, negotiates, and emits problem responses.
#[derive(Clone)]
pub struct Dispatcher {
    translator: Translator,
    formatters: FormatterRegistry,
    handled: Option<HandledPredicate>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Translator::default(), FormatterRegistry::default())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("translator", &self.translator)
            .field("formatters", &self.formatters)
            .field("handled_predicate", &self.handled.is_some())
            .finish()
    }
}

impl Dispatcher {
    pub fn new(translator: Translator, formatters: FormatterRegistry) -> Self {
        Self {
            translator,
            formatters,
            handled: None,
        }
    }

    /// Install a framework-supplied handled-response predicate, consulted by
    /// the catch-all layer before it touches a response.
    pub fn with_handled_predicate(mut self, predicate: HandledPredicate) -> Self {
        self.handled = Some(predicate);
        self
    }

    #[must_use]
    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Whether a response counts as already handled.
    ///
    /// Without an installed predicate a response is handled once it carries
    /// a problem content-type and no stashed problem is waiting for
    /// dispatch.
    #[must_use]
    pub fn is_handled(&self, response: &Response) -> bool {
        match &self.handled {
            Some(predicate) => predicate(response),
            None => {
                response.extensions().get::<Problem>().is_none()
                    && crate::layer::is_problem_response(response)
            }
        }
    }

    /// The single render path: negotiate the format from the Accept header
    /// value, select a registered formatter (XML only when both requested
    /// and available), and serialize.
    ///
    /// A formatter failure degrades to a minimal JSON body with the
    /// problem's status; the pipeline never emits a non-problem payload.
    #[must_use]
    pub fn render(&self, accept: Option<&str>, problem: &Problem) -> Rendered {
        let requested = negotiate(accept);
        let (format, formatter) = self.formatters.select(requested);
        match formatter.format(problem) {
            Ok(body) => Rendered {
                status: problem.status,
                content_type: format.content_type(),
                body: Bytes::from(body),
            },
            Err(e) => {
                tracing::error!(error = %e, "problem formatter failed, emitting minimal body");
                Rendered {
                    status: problem.status,
                    content_type: ProblemFormat::Json.content_type(),
                    body: Bytes::from(format!(
                        r#"{{"type":"about:blank","status":{}}}"#,
                        problem.status.as_u16()
                    )),
                }
            }
        }
    }

    /// Direct response adapter.
    #[must_use]
    pub fn response(&self, accept: Option<&str>, problem: &Problem) -> Response {
        self.render(accept, problem).into_response()
    }

    /// Result-object adapter, for handlers that want a value to return.
    pub fn api_result(&self, accept: Option<&str>, problem: &Problem) -> ProblemResponse {
        ProblemResponse(self.render(accept, problem))
    }

    /// Translate a fault and dispatch it in one step.
    #[must_use]
    pub fn respond_to_error<E>(
        &self,
        accept: Option<&str>,
        fault: &E,
        instance: Option<&str>,
    ) -> Response
    where
        E: std::error::Error + 'static,
    {
        let problem = self.translator.translate(fault, instance);
        self.response(accept, &problem)
    }
}
