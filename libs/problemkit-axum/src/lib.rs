//! Axum integration for the problemkit problem-detail pipeline
//!
//! Everything converges on one dispatch path: negotiate the wire format from
//! the request's Accept header, serialize with a registered formatter, and
//! emit a response whose status and content-type come from the problem
//! itself. Three surfaces feed it:
//! - the per-route [`layer::problem_middleware`],
//! - the direct [`dispatch::Dispatcher`] builder calls,
//! - the process-wide [`layer::catch_fault_middleware`] fault boundary.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod dispatch;
pub mod layer;
pub mod result;

pub use dispatch::{Dispatcher, HandledPredicate, ProblemResponse, Rendered};
pub use layer::{catch_fault_middleware, is_problem_response, problem_middleware};
pub use result::{ApiResult, bad_request, conflict, internal_error, not_found};

// Re-export the data layer so module authors need a single import.
pub use problemkit::{
    CONTENT_TYPE_PROBLEM_JSON, CONTENT_TYPE_PROBLEM_XML, ExtensionValue, FormatterRegistry,
    NotImplemented, Problem, ProblemError, ProblemFormat, Translator,
};
