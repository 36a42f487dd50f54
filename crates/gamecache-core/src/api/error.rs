//! Errors from the remote catalog.
//!
//! The catalog API is unauthenticated, so every 4xx other than 404 and 429
//! means the service refused this particular request.

use reqwest::StatusCode;
use thiserror::Error;

/// Longest response body kept in an error message, in bytes
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Catalog service rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Not found in the catalog: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Map a non-success status and its body to an error
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = truncate_body(body);
        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(body),
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
            s if s.is_server_error() => ApiError::ServerError(body),
            s if s.is_client_error() => ApiError::Rejected {
                status: s.as_u16(),
                body,
            },
            s => ApiError::InvalidResponse(format!("Unexpected status {}: {}", s, body)),
        }
    }
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let cut = (0..=MAX_ERROR_BODY_LENGTH)
        .rev()
        .find(|&i| body.is_char_boundary(i))
        .unwrap_or(0);
    format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, "Not found"),
            ApiError::NotFound(ref body) if body == "Not found"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::TOO_MANY_REQUESTS, ""),
            ApiError::RateLimited
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream"),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, "bad"),
            ApiError::Rejected { status: 400, ref body } if body == "bad"
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_MODIFIED, ""),
            ApiError::InvalidResponse(ref msg) if msg.contains("304")
        ));
    }

    #[test]
    fn test_auth_statuses_are_plain_rejections() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = ApiError::from_status(status, "nope");
            assert!(matches!(err, ApiError::Rejected { .. }));
            let message = err.to_string();
            assert!(message.contains(&status.as_u16().to_string()));
            assert!(!message.to_lowercase().contains("credential"));
        }
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        let body = "é".repeat(400); // 800 bytes, 2 bytes per char
        let truncated = truncate_body(&body);
        assert!(truncated.starts_with(&"é".repeat(250)));
        assert!(truncated.ends_with("(truncated, 800 total bytes)"));
    }
}
