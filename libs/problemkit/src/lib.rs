//! RFC 9457 Problem Details: data model, content negotiation, translation
//!
//! This crate provides the pure data layer of the problem-detail pipeline,
//! with no hard dependency on an HTTP framework. It includes:
//! - the `Problem` model with a closed extension-member set (`problem`)
//! - Accept-header negotiation between problem+json and problem+xml
//!   (`negotiate`)
//! - pluggable serializer capabilities with a JSON fallback (`format`)
//! - translation of explicit problems, runtime faults, and validation
//!   failures into normalized problems (`translate`)
//!
//! The `axum` feature adds `IntoResponse` impls; `problemkit-axum` builds the
//! full request-scoped dispatch pipeline on top.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod format;
pub mod negotiate;
pub mod problem;
pub mod translate;

// Re-export commonly used types
pub use format::{FormatError, FormatterRegistry, JsonFormatter, ProblemFormatter, XmlFormatter};
pub use negotiate::{ProblemFormat, negotiate};
pub use problem::{
    APPLICATION_PROBLEM_JSON, APPLICATION_PROBLEM_XML, CONTENT_TYPE_PROBLEM_JSON,
    CONTENT_TYPE_PROBLEM_XML, ExtensionValue, Problem,
};
pub use translate::{
    DEFAULT_TYPE_AUTHORITY, GENERIC_VALIDATION_MESSAGE, MODEL_STATE_KEY, NotImplemented,
    ProblemError, Translator,
};
