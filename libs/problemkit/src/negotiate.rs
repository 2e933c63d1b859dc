//! Content negotiation for problem responses.
//!
//! Exactly two wire formats exist: problem+json and problem+xml. JSON is the
//! safe default; XML is produced only when the caller asks for it
//! unambiguously.

use crate::problem::{
    APPLICATION_PROBLEM_JSON, APPLICATION_PROBLEM_XML, CONTENT_TYPE_PROBLEM_JSON,
    CONTENT_TYPE_PROBLEM_XML,
};

/// The wire format chosen for a problem response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemFormat {
    Json,
    Xml,
}

impl ProblemFormat {
    /// Canonical media type identifier, without parameters.
    #[must_use]
    pub const fn media_type(self) -> &'static str {
        match self {
            Self::Json => APPLICATION_PROBLEM_JSON,
            Self::Xml => APPLICATION_PROBLEM_XML,
        }
    }

    /// Exact `Content-Type` header value for responses in this format.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Json => CONTENT_TYPE_PROBLEM_JSON,
            Self::Xml => CONTENT_TYPE_PROBLEM_XML,
        }
    }
}

/// Pick the response format from an `Accept` header value.
///
/// Precedence is decided by presence alone; quality values never weigh in:
///
/// 1. `*/*` or `application/*` anywhere in the list resolves to JSON.
/// 2. Otherwise `application/xml` or `text/xml` resolves to XML.
/// 3. Everything else, including an absent header, resolves to JSON.
///
/// Note that the wildcard rule wins even when XML tokens are also present:
/// `Accept: application/xml, */*` resolves to JSON.
#[must_use]
pub fn negotiate(accept: Option<&str>) -> ProblemFormat {
    let Some(accept) = accept else {
        return ProblemFormat::Json;
    };

    let mut wants_xml = false;
    for range in accept.split(',') {
        // Media range without parameters (";q=0.9" and friends).
        let token = range.split(';').next().unwrap_or("").trim();
        if token.eq_ignore_ascii_case("*/*") || token.eq_ignore_ascii_case("application/*") {
            return ProblemFormat::Json;
        }
        if token.eq_ignore_ascii_case("application/xml") || token.eq_ignore_ascii_case("text/xml") {
            wants_xml = true;
        }
    }

    if wants_xml {
        ProblemFormat::Xml
    } else {
        ProblemFormat::Json
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn absent_header_resolves_to_json() {
        assert_eq!(negotiate(None), ProblemFormat::Json);
        assert_eq!(negotiate(Some("")), ProblemFormat::Json);
    }

    #[test]
    fn wildcard_resolves_to_json() {
        assert_eq!(negotiate(Some("*/*")), ProblemFormat::Json);
        assert_eq!(negotiate(Some("application/*")), ProblemFormat::Json);
    }

    #[test]
    fn xml_tokens_resolve_to_xml() {
        assert_eq!(negotiate(Some("application/xml")), ProblemFormat::Xml);
        assert_eq!(negotiate(Some("text/xml")), ProblemFormat::Xml);
        assert_eq!(negotiate(Some("Application/XML")), ProblemFormat::Xml);
    }

    #[test]
    fn wildcard_beats_xml_regardless_of_order() {
        assert_eq!(negotiate(Some("application/xml, */*")), ProblemFormat::Json);
        assert_eq!(negotiate(Some("*/*, application/xml, text/xml")), ProblemFormat::Json);
    }

    #[test]
    fn unrelated_tokens_resolve_to_json() {
        assert_eq!(negotiate(Some("text/plain")), ProblemFormat::Json);
        assert_eq!(negotiate(Some("application/json")), ProblemFormat::Json);
        assert_eq!(negotiate(Some("text/html, image/png")), ProblemFormat::Json);
    }

    #[test]
    fn parameters_are_ignored_when_matching_tokens() {
        assert_eq!(negotiate(Some("application/xml;q=0.1")), ProblemFormat::Xml);
        assert_eq!(negotiate(Some("text/xml; charset=utf-8")), ProblemFormat::Xml);
        assert_eq!(negotiate(Some("*/*;q=0.8, application/xml")), ProblemFormat::Json);
    }

    #[test]
    fn negotiation_is_deterministic_for_identical_input() {
        let header = Some("text/html, application/xml;q=0.9, text/xml");
        assert_eq!(negotiate(header), negotiate(header));
        assert_eq!(negotiate(header), ProblemFormat::Xml);
    }

    #[test]
    fn content_type_carries_charset() {
        assert_eq!(
            ProblemFormat::Json.content_type(),
            "application/problem+json; charset=utf-8"
        );
        assert_eq!(
            ProblemFormat::Xml.content_type(),
            "application/problem+xml; charset=utf-8"
        );
    }
}
