//! Ergonomic result types for API handlers
//!
//! Handlers return an explicit error variant instead of relying on
//! exception-style control flow: the error side is always a
//! [`ProblemError`], which renders as a problem response and is re-negotiated
//! by the surface layers.

use http::StatusCode;
use problemkit::{Problem, ProblemError};

/// Standard result type for API operations
///
/// ```ignore
/// async fn handler() -> ApiResult<Json<User>> {
///     let user = fetch_user().await?;  // any Into<ProblemError> converts
///     Ok(Json(user))
/// }
/// ```
pub type ApiResult<T = ()> = Result<T, ProblemError>;

// Convenience constructors for common problem shapes.

pub fn bad_request(detail: impl Into<String>) -> Problem {
    Problem::new(StatusCode::BAD_REQUEST, "Bad Request", detail)
}

pub fn not_found(detail: impl Into<String>) -> Problem {
    Problem::new(StatusCode::NOT_FOUND, "Not Found", detail)
}

pub fn conflict(detail: impl Into<String>) -> Problem {
    Problem::new(StatusCode::CONFLICT, "Conflict", detail)
}

pub fn internal_error(detail: impl Into<String>) -> Problem {
    Problem::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
        detail,
    )
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn api_result_converts_problems_with_question_mark() {
        fn falls_through() -> ApiResult<u32> {
            let looked_up: Result<u32, Problem> = Err(not_found("no such widget"));
            Ok(looked_up?)
        }

        let err = falls_through().unwrap_err();
        assert_eq!(err.problem().status, StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "no such widget");
    }

    #[test]
    fn convenience_constructors() {
        assert_eq!(bad_request("x").status, StatusCode::BAD_REQUEST);
        assert_eq!(not_found("x").status, StatusCode::NOT_FOUND);
        assert_eq!(conflict("x").status, StatusCode::CONFLICT);
        assert_eq!(internal_error("x").status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
