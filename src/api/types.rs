//! API status classification and error types.

use serde::Deserialize;

/// Coarse classification of a failed backend response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    InvalidArgument,
    NotFound,
    Conflict,
    Unauthenticated,
    PermissionDenied,
    ResourceExhausted,
    Unavailable,
    Unknown,
}

impl ApiStatus {
    /// Convert from HTTP status code to internal API status
    pub fn from_http_status(http_status: u16) -> Self {
        match http_status {
            400 | 422 => ApiStatus::InvalidArgument,
            401 => ApiStatus::Unauthenticated,
            403 => ApiStatus::PermissionDenied,
            404 => ApiStatus::NotFound,
            409 => ApiStatus::Conflict,
            429 => ApiStatus::ResourceExhausted,
            500..=599 => ApiStatus::Unavailable,
            _ => ApiStatus::Unknown,
        }
    }

    pub fn error_message(&self) -> &'static str {
        match self {
            ApiStatus::InvalidArgument => "Invalid request",
            ApiStatus::NotFound => "Asset not found",
            ApiStatus::Conflict => "Asset with the given id already exists",
            ApiStatus::Unauthenticated => "Authentication failed",
            ApiStatus::PermissionDenied => "Permission denied",
            ApiStatus::ResourceExhausted => "Rate limit exceeded. Please wait and try again",
            ApiStatus::Unavailable => "Backend temporarily unavailable",
            ApiStatus::Unknown => "Unknown error occurred",
        }
    }
}

impl std::fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error_message())
    }
}

/// Error body returned by the backend (`{"detail": "..."}`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// API error with status code and details.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: ApiStatus,
    pub http_status: u16,
    pub message: String,
}

impl ApiError {
    /// Create from HTTP status code and response body
    pub fn from_http_response(http_status: u16, body: &str) -> Self {
        let status = ApiStatus::from_http_status(http_status);

        let detail = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.detail)
            .unwrap_or_else(|_| body.trim().to_string());

        let message = if detail.is_empty() {
            format!("API error (HTTP {}): {}", http_status, status.error_message())
        } else {
            format!("API error (HTTP {}): {}", http_status, detail)
        };

        Self {
            status,
            http_status,
            message,
        }
    }
}

/// Outcome of the backend reachability check performed by `ApiStore::initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Ok,
    InvalidUrl(String),
    ConnectionError(String),
    ServerError(String),
    UnexpectedStatus(String),
}
