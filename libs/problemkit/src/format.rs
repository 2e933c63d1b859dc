//! Serializer capabilities for problem bodies.
//!
//! Formatters are a pluggable capability keyed by [`ProblemFormat`]. The
//! registry always has a JSON formatter; XML is optional, and a deployment
//! without one silently degrades XML requests to JSON so the pipeline never
//! fails for lack of a serializer.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::negotiate::ProblemFormat;
use crate::problem::{ExtensionValue, Problem};

/// Error produced by a formatter.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A serializer capability turning a [`Problem`] into wire bytes.
pub trait ProblemFormatter: Send + Sync {
    /// Serialize the problem into the body for this formatter's format.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] when the underlying serializer rejects the
    /// value.
    fn format(&self, problem: &Problem) -> Result<Vec<u8>, FormatError>;
}

/// JSON formatter backed by `serde_json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormatter;

impl ProblemFormatter for JsonFormatter {
    fn format(&self, problem: &Problem) -> Result<Vec<u8>, FormatError> {
        Ok(serde_json::to_vec(problem)?)
    }
}

/// XML formatter: element-per-member serialization under a `problem` root,
/// per RFC 9457 appendix B. Arrays become sequences of `i` elements.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlFormatter;

impl ProblemFormatter for XmlFormatter {
    fn format(&self, problem: &Problem) -> Result<Vec<u8>, FormatError> {
        let mut out = String::with_capacity(256);
        out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        out.push_str(r#"<problem xmlns="urn:ietf:rfc:7807">"#);
        write_element(&mut out, "type", &problem.type_url);
        if let Some(title) = &problem.title {
            write_element(&mut out, "title", title);
        }
        write_element(&mut out, "status", &problem.status.as_u16().to_string());
        if let Some(detail) = &problem.detail {
            write_element(&mut out, "detail", detail);
        }
        if let Some(instance) = &problem.instance {
            write_element(&mut out, "instance", instance);
        }
        for (key, value) in &problem.extensions {
            write_value(&mut out, key, value);
        }
        out.push_str("</problem>");
        Ok(out.into_bytes())
    }
}

fn write_element(out: &mut String, name: &str, text: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
    escape_into(out, text);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn write_value(out: &mut String, name: &str, value: &ExtensionValue) {
    match value {
        ExtensionValue::Bool(b) => write_element(out, name, if *b { "true" } else { "false" }),
        ExtensionValue::Integer(n) => {
            // Writing to a String cannot fail.
            let _ = write!(out, "<{name}>{n}</{name}>");
        }
        ExtensionValue::Number(n) => {
            let _ = write!(out, "<{name}>{n}</{name}>");
        }
        ExtensionValue::String(s) => write_element(out, name, s),
        ExtensionValue::StringList(items) => {
            out.push('<');
            out.push_str(name);
            out.push('>');
            for item in items {
                write_element(out, "i", item);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        ExtensionValue::Map(entries) => {
            out.push('<');
            out.push_str(name);
            out.push('>');
            for (key, entry) in entries {
                write_value(out, key, entry);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

fn escape_into(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}

/// Formatter lookup keyed by format.
///
/// The JSON slot is mandatory; the XML slot is a deployment choice.
#[derive(Clone)]
pub struct FormatterRegistry {
    json: Arc<dyn ProblemFormatter>,
    xml: Option<Arc<dyn ProblemFormatter>>,
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self {
            json: Arc::new(JsonFormatter),
            xml: Some(Arc::new(XmlFormatter)),
        }
    }
}

impl std::fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatterRegistry")
            .field("xml_registered", &self.xml.is_some())
            .finish()
    }
}

impl FormatterRegistry {
    /// Registry with a custom JSON formatter and no XML capability.
    #[must_use]
    pub fn new(json: Arc<dyn ProblemFormatter>) -> Self {
        Self { json, xml: None }
    }

    /// Registry with the built-in JSON formatter only.
    #[must_use]
    pub fn json_only() -> Self {
        Self {
            json: Arc::new(JsonFormatter),
            xml: None,
        }
    }

    /// Register an XML formatter capability.
    #[must_use]
    pub fn with_xml(mut self, xml: Arc<dyn ProblemFormatter>) -> Self {
        self.xml = Some(xml);
        self
    }

    /// Select the formatter for a negotiated format.
    ///
    /// XML is served only when it was requested *and* an XML formatter is
    /// registered; every other case falls back to JSON. The returned format
    /// is the effective one, so the content-type header always matches the
    /// bytes produced.
    #[must_use]
    pub fn select(&self, requested: ProblemFormat) -> (ProblemFormat, &dyn ProblemFormatter) {
        match (requested, &self.xml) {
            (ProblemFormat::Xml, Some(xml)) => (ProblemFormat::Xml, xml.as_ref()),
            _ => (ProblemFormat::Json, self.json.as_ref()),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::StatusCode;
    use std::collections::BTreeMap;

    #[test]
    fn select_falls_back_to_json_without_xml_capability() {
        let registry = FormatterRegistry::json_only();
        let (format, _) = registry.select(ProblemFormat::Xml);
        assert_eq!(format, ProblemFormat::Json);
    }

    #[test]
    fn select_serves_xml_when_registered() {
        let registry = FormatterRegistry::default();
        let (format, _) = registry.select(ProblemFormat::Xml);
        assert_eq!(format, ProblemFormat::Xml);
    }

    #[test]
    fn select_never_serves_xml_for_json_requests() {
        let registry = FormatterRegistry::default();
        let (format, _) = registry.select(ProblemFormat::Json);
        assert_eq!(format, ProblemFormat::Json);
    }

    #[test]
    fn xml_body_is_element_per_member() {
        let p = Problem::new(StatusCode::INTERNAL_SERVER_ERROR, "Boom", "bad state")
            .with_type("urn:problemkit:fault:InvalidOperation");
        let body = XmlFormatter.format(&p).unwrap();
        let xml = String::from_utf8(body).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<problem xmlns="urn:ietf:rfc:7807">"#));
        assert!(xml.contains("<type>urn:problemkit:fault:InvalidOperation</type>"));
        assert!(xml.contains("<status>500</status>"));
        assert!(xml.contains("<detail>bad state</detail>"));
        assert!(xml.ends_with("</problem>"));
    }

    #[test]
    fn xml_body_escapes_markup_characters() {
        let p = Problem::new(StatusCode::BAD_REQUEST, "Bad Request", "a < b && c > d");
        let body = XmlFormatter.format(&p).unwrap();
        let xml = String::from_utf8(body).unwrap();
        assert!(xml.contains("<detail>a &lt; b &amp;&amp; c &gt; d</detail>"));
    }

    #[test]
    fn xml_body_serializes_extension_maps_and_lists() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "email".to_owned(),
            ExtensionValue::StringList(vec!["Email is required".to_owned()]),
        );
        let p = Problem::from_status(StatusCode::BAD_REQUEST)
            .with_extension("modelState", ExtensionValue::Map(fields));
        let body = XmlFormatter.format(&p).unwrap();
        let xml = String::from_utf8(body).unwrap();
        assert!(xml.contains("<modelState><email><i>Email is required</i></email></modelState>"));
    }

    #[test]
    fn json_formatter_matches_serde_json() {
        let p = Problem::from_status(StatusCode::NOT_FOUND);
        let body = JsonFormatter.format(&p).unwrap();
        assert_eq!(body, serde_json::to_vec(&p).unwrap());
    }
}
