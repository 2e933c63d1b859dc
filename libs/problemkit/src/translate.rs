//! Translation of heterogeneous error sources into [`Problem`] values.
//!
//! Three origin shapes converge here: an explicit problem built by
//! application code, an arbitrary runtime fault, and a field-validation
//! failure map. All three leave fully defaulted, so downstream consumers
//! never see a non-normalized status.

use std::any::Any;
use std::collections::BTreeMap;

use http::StatusCode;

use crate::problem::{ExtensionValue, Problem};

/// Extension key carrying per-field validation messages.
pub const MODEL_STATE_KEY: &str = "modelState";

/// Substitute for a blank validation message.
pub const GENERIC_VALIDATION_MESSAGE: &str = "An error has occurred.";

/// Placeholder authority used when none is configured.
pub const DEFAULT_TYPE_AUTHORITY: &str = "urn:problemkit:fault:";

/// A fault that carries an already-translated [`Problem`] through error
/// propagation.
///
/// The wrapper exclusively owns its problem; callers extract it explicitly
/// via [`ProblemError::problem`] or [`ProblemError::into_problem`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", .problem.message())]
pub struct ProblemError {
    problem: Problem,
}

impl ProblemError {
    pub fn new(problem: Problem) -> Self {
        Self { problem }
    }

    /// The carried problem.
    #[must_use]
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// Mutable access, for enriching a problem while the fault is still in
    /// flight (single-request scope, no concurrent mutation).
    pub fn problem_mut(&mut self) -> &mut Problem {
        &mut self.problem
    }

    /// Unwrap into the carried problem.
    #[must_use]
    pub fn into_problem(self) -> Problem {
        self.problem
    }
}

impl From<Problem> for ProblemError {
    fn from(problem: Problem) -> Self {
        Self::new(problem)
    }
}

/// Axum integration: a translated fault responds as its problem would.
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ProblemError {
    fn into_response(self) -> axum::response::Response {
        self.into_problem().into_response()
    }
}

/// Marker fault for operations that are not implemented.
///
/// This is the single fault type the translator maps to 501 instead of 500.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct NotImplemented {
    message: String,
}

impl NotImplemented {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Translates error sources into normalized problems.
///
/// The type-URI authority is injected at construction time and read-only
/// afterwards; there is no process-global configuration.
#[derive(Debug, Clone)]
pub struct Translator {
    type_authority: String,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(DEFAULT_TYPE_AUTHORITY)
    }
}

impl Translator {
    pub fn new(type_authority: impl Into<String>) -> Self {
        Self {
            type_authority: type_authority.into(),
        }
    }

    /// The configured authority prefix for synthesized type URIs.
    #[must_use]
    pub fn type_authority(&self) -> &str {
        &self.type_authority
    }

    /// Type URI synthesized for field-validation failures.
    #[must_use]
    pub fn validation_type_url(&self) -> String {
        format!("{}ValidationFailed", self.type_authority)
    }

    /// Explicit-problem path: passed through as-is.
    ///
    /// The status-defaulting invariant is enforced structurally: raw status
    /// codes only enter a [`Problem`] through the normalizing constructors
    /// and the wire deserializer.
    #[must_use]
    pub fn from_problem(&self, problem: Problem) -> Problem {
        problem
    }

    /// Generic-fault path.
    ///
    /// Status 500 (501 for [`NotImplemented`]), `type` synthesized from the
    /// configured authority and the fault's fully-qualified type name,
    /// `detail` from the fault's message, `instance` from the caller. A fault
    /// that is itself a [`ProblemError`] is not re-wrapped: its problem is
    /// reused verbatim.
    pub fn translate<E>(&self, fault: &E, instance: Option<&str>) -> Problem
    where
        E: std::error::Error + 'static,
    {
        let any: &dyn Any = fault;
        if let Some(translated) = any.downcast_ref::<ProblemError>() {
            return translated.problem().clone();
        }

        let status = if any.is::<NotImplemented>() {
            StatusCode::NOT_IMPLEMENTED
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let mut problem = Problem::from_status(status)
            .with_type(format!("{}{}", self.type_authority, std::any::type_name::<E>()))
            .with_detail(fault.to_string());
        if let Some(instance) = instance {
            problem = problem.with_instance(instance);
        }
        problem
    }

    /// Field-validation path.
    ///
    /// Always 400. Each field with at least one message appears under the
    /// `modelState` extension as an array of non-empty strings; a blank
    /// message becomes [`GENERIC_VALIDATION_MESSAGE`]; fields with zero
    /// messages are omitted. The synthesized type URI can be overridden with
    /// [`Problem::with_type`] afterwards.
    pub fn validation_to_problem(
        &self,
        field_errors: &BTreeMap<String, Vec<String>>,
        instance: Option<&str>,
    ) -> Problem {
        let mut model_state = BTreeMap::new();
        for (field, messages) in field_errors {
            if messages.is_empty() {
                continue;
            }
            let messages = messages
                .iter()
                .map(|m| {
                    if m.is_empty() {
                        GENERIC_VALIDATION_MESSAGE.to_owned()
                    } else {
                        m.clone()
                    }
                })
                .collect();
            model_state.insert(field.clone(), ExtensionValue::StringList(messages));
        }

        let mut problem = Problem::from_status(StatusCode::BAD_REQUEST)
            .with_type(self.validation_type_url())
            .with_extension(MODEL_STATE_KEY, ExtensionValue::Map(model_state));
        if let Some(instance) = instance {
            problem = problem.with_instance(instance);
        }
        problem
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("bad state")]
    struct InvalidOperation;

    #[test]
    fn generic_fault_maps_to_500_with_synthesized_type() {
        let translator = Translator::default();
        let problem = translator.translate(&InvalidOperation, Some("/api/widgets"));

        assert_eq!(problem.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(problem.type_url.starts_with(DEFAULT_TYPE_AUTHORITY));
        assert!(problem.type_url.ends_with("InvalidOperation"));
        assert_eq!(problem.title, None);
        assert_eq!(problem.detail.as_deref(), Some("bad state"));
        assert_eq!(problem.instance.as_deref(), Some("/api/widgets"));
    }

    #[test]
    fn not_implemented_is_the_single_501_special_case() {
        let translator = Translator::default();
        let problem = translator.translate(&NotImplemented::new("no such operation"), None);

        assert_eq!(problem.status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(problem.detail.as_deref(), Some("no such operation"));
        assert_eq!(problem.instance, None);
    }

    #[test]
    fn custom_authority_prefixes_the_type_url() {
        let translator = Translator::new("https://errors.example.com/");
        let problem = translator.translate(&InvalidOperation, None);
        assert!(problem.type_url.starts_with("https://errors.example.com/"));
    }

    #[test]
    fn translating_a_translated_fault_reuses_the_problem_verbatim() {
        let translator = Translator::default();
        let first = translator.translate(&InvalidOperation, Some("/api/widgets"));
        let fault = ProblemError::new(first.clone());

        let second = translator.translate(&fault, Some("/other/path"));
        assert_eq!(second, first);
    }

    #[test]
    fn explicit_problem_passes_through_unchanged() {
        let translator = Translator::default();
        let problem = Problem::new(StatusCode::FORBIDDEN, "Forbidden", "no credit")
            .with_type("https://example.com/probs/out-of-credit");
        assert_eq!(translator.from_problem(problem.clone()), problem);
    }

    #[test]
    fn validation_map_shapes_model_state() {
        let translator = Translator::default();
        let mut errors = BTreeMap::new();
        errors.insert("email".to_owned(), vec!["Email is required".to_owned()]);
        errors.insert("age".to_owned(), Vec::new());

        let problem = translator.validation_to_problem(&errors, None);
        assert_eq!(problem.status, StatusCode::BAD_REQUEST);
        assert_eq!(problem.type_url, translator.validation_type_url());

        let Some(ExtensionValue::Map(model_state)) = problem.extensions.get(MODEL_STATE_KEY)
        else {
            panic!("modelState extension missing");
        };
        assert_eq!(
            model_state.get("email"),
            Some(&ExtensionValue::StringList(vec![
                "Email is required".to_owned()
            ]))
        );
        assert!(!model_state.contains_key("age"));
    }

    #[test]
    fn blank_validation_messages_get_the_generic_fallback() {
        let translator = Translator::default();
        let mut errors = BTreeMap::new();
        errors.insert(
            "name".to_owned(),
            vec![String::new(), "Name is too long".to_owned()],
        );

        let problem = translator.validation_to_problem(&errors, None);
        let Some(ExtensionValue::Map(model_state)) = problem.extensions.get(MODEL_STATE_KEY)
        else {
            panic!("modelState extension missing");
        };
        assert_eq!(
            model_state.get("name"),
            Some(&ExtensionValue::StringList(vec![
                GENERIC_VALIDATION_MESSAGE.to_owned(),
                "Name is too long".to_owned(),
            ]))
        );
    }

    #[test]
    fn problem_error_message_prefers_detail_then_title() {
        let with_detail = ProblemError::new(Problem::new(
            StatusCode::CONFLICT,
            "Conflict",
            "already exists",
        ));
        assert_eq!(with_detail.to_string(), "already exists");

        let with_title =
            ProblemError::new(Problem::from_status(StatusCode::CONFLICT).with_title("Conflict"));
        assert_eq!(with_title.to_string(), "Conflict");
    }

    #[test]
    fn problem_error_unwraps_explicitly() {
        let problem = Problem::from_status(StatusCode::NOT_FOUND);
        let mut fault = ProblemError::from(problem.clone());
        assert_eq!(fault.problem(), &problem);

        fault.problem_mut().instance = Some("/missing".to_owned());
        assert_eq!(fault.into_problem().instance.as_deref(), Some("/missing"));
    }
}
