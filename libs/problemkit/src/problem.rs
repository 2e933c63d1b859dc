//! RFC 9457 Problem Details for HTTP APIs (pure data model, no HTTP framework dependencies)

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

/// Media type for Problem Details bodies serialized as JSON.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Media type for Problem Details bodies serialized as XML.
pub const APPLICATION_PROBLEM_XML: &str = "application/problem+xml";

/// Exact `Content-Type` header value for JSON problem responses.
pub const CONTENT_TYPE_PROBLEM_JSON: &str = "application/problem+json; charset=utf-8";

/// Exact `Content-Type` header value for XML problem responses.
pub const CONTENT_TYPE_PROBLEM_XML: &str = "application/problem+xml; charset=utf-8";

/// Custom serializer for `StatusCode` to u16
#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
fn serialize_status_code<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

/// Custom deserializer for `StatusCode` from u16.
///
/// Out-of-range codes normalize to 500 rather than failing: a problem body
/// read off the wire must honor the same status invariant as one built
/// locally.
fn deserialize_status_code<'de, D>(deserializer: D) -> Result<StatusCode, D::Error>
where
    D: Deserializer<'de>,
{
    let code = u16::deserialize(deserializer)?;
    Ok(StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
}

/// Default for a wire body missing its `status` member entirely.
fn default_status_code() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

/// A single extension member value.
///
/// Problem extensions are a closed set of serializable kinds rather than an
/// open dynamic value, so the wire contract stays well-defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(untagged)]
pub enum ExtensionValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
    StringList(Vec<String>),
    Map(BTreeMap<String, ExtensionValue>),
}

impl From<bool> for ExtensionValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ExtensionValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for ExtensionValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for ExtensionValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for ExtensionValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<String>> for ExtensionValue {
    fn from(v: Vec<String>) -> Self {
        Self::StringList(v)
    }
}

impl From<BTreeMap<String, ExtensionValue>> for ExtensionValue {
    fn from(v: BTreeMap<String, ExtensionValue>) -> Self {
        Self::Map(v)
    }
}

/// RFC 9457 Problem Details for HTTP APIs.
///
/// Extension members are flattened alongside the five standard members on
/// the wire, as the RFC requires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[cfg_attr(
    feature = "utoipa",
    schema(
        title = "Problem",
        description = "RFC 9457 Problem Details for HTTP APIs"
    )
)]
#[must_use]
pub struct Problem {
    /// A URI reference that identifies the problem type.
    /// When dereferenced, it might provide human-readable documentation.
    #[serde(rename = "type")]
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// The HTTP status code for this occurrence of the problem.
    /// Serializes as u16 for RFC 9457 compatibility.
    #[serde(
        serialize_with = "serialize_status_code",
        deserialize_with = "deserialize_status_code",
        default = "default_status_code"
    )]
    #[cfg_attr(feature = "utoipa", schema(value_type = u16))]
    pub status: StatusCode,
    /// A human-readable explanation specific to this occurrence of the problem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// A URI reference that identifies the specific occurrence of the problem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Extension members, flattened to the top level on the wire.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, ExtensionValue>,
}

impl Problem {
    /// Create a new Problem with the given status, title, and detail.
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".to_owned(),
            title: Some(title.into()),
            status,
            detail: Some(detail.into()),
            instance: None,
            extensions: BTreeMap::new(),
        }
    }

    /// Create a minimal but compliant Problem carrying only a status code.
    pub fn from_status(status: StatusCode) -> Self {
        Self {
            type_url: "about:blank".to_owned(),
            title: None,
            status,
            detail: None,
            instance: None,
            extensions: BTreeMap::new(),
        }
    }

    /// Create a Problem from a raw status code, normalizing unset or
    /// out-of-range codes to 500.
    pub fn from_raw_status(code: u16) -> Self {
        Self::from_status(StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = Some(uri.into());
        self
    }

    /// Attach an extension member. Keys are unique; a repeated key replaces
    /// the earlier value.
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<ExtensionValue>) -> Self {
        self.extensions.insert(key.into(), value.into());
        self
    }

    /// Human-readable message for this problem: `detail`, falling back to
    /// `title`, then to the status canonical reason.
    #[must_use]
    pub fn message(&self) -> &str {
        self.detail
            .as_deref()
            .or(self.title.as_deref())
            .or_else(|| self.status.canonical_reason())
            .unwrap_or("")
    }
}

/// Axum integration: make Problem directly usable as a response.
///
/// The body is the default JSON rendering. A clone of the problem is stashed
/// in the response extensions so an outer surface can re-negotiate the wire
/// format without re-translating.
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for Problem {
    fn into_response(self) -> axum::response::Response {
        use axum::http::HeaderValue;
        use axum::response::IntoResponse as _;

        let body = serde_json::to_vec(&self).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize problem body");
            br#"{"type":"about:blank","status":500}"#.to_vec()
        });
        let mut resp = (self.status, body).into_response();
        resp.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static(CONTENT_TYPE_PROBLEM_JSON),
        );
        resp.extensions_mut().insert(self);
        resp
    }
}
