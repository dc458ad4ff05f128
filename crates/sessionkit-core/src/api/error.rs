use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - token is missing, invalid or expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Pull the `error` field out of a `{"error": "..."}` body, if present.
    fn error_message(body: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        value.get("error")?.as_str().map(str::to_string)
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            400 => match Self::error_message(body) {
                Some(message) => ApiError::Rejected(message),
                None => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
            },
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_maps_known_codes() {
        assert!(matches!(ApiError::from_status(StatusCode::UNAUTHORIZED, ""), ApiError::Unauthorized));
        assert!(matches!(ApiError::from_status(StatusCode::FORBIDDEN, "no"), ApiError::AccessDenied(_)));
        assert!(matches!(ApiError::from_status(StatusCode::NOT_FOUND, ""), ApiError::NotFound(_)));
        assert!(matches!(ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""), ApiError::RateLimited));
        assert!(matches!(ApiError::from_status(StatusCode::BAD_GATEWAY, ""), ApiError::ServerError(_)));
        assert!(matches!(ApiError::from_status(StatusCode::IM_A_TEAPOT, ""), ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_bad_request_surfaces_server_message() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"error":"Wrong password"}"#);
        match err {
            ApiError::Rejected(message) => assert_eq!(message, "Wrong password"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bad_request_without_message() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "oops");
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(MAX_ERROR_BODY_LENGTH + 10);
        match ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body) {
            ApiError::ServerError(message) => {
                assert!(message.contains("truncated"));
                assert!(message.len() < body.len() + 40);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let body = "é".repeat(MAX_ERROR_BODY_LENGTH);
        let truncated = ApiError::truncate_body(&body);
        assert!(truncated.ends_with("total bytes)"));
    }
}
