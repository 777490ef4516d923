use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Fiscal document failed normalization or checksum validation
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Month or year outside the accepted range
    #[error("Invalid period: month {month}, year {year}")]
    InvalidPeriod { month: u32, year: i32 },

    /// Validation errors for request payloads
    #[error("Validation error: {0}")]
    Validation(String),

    /// Billing API rejected the bearer token (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Statement could not be fetched (non-401 status, timeout, bad body, repeated 401)
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        HttpResponse::build(status_code).json(serde_json::json!({
            "error": {
                "message": error_message,
                "code": status_code.as_u16(),
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidDocument(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidPeriod { .. } => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            // Upstream credential failure, not the caller's
            AppError::Unauthorized(_) => StatusCode::BAD_GATEWAY,
            AppError::Fetch(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Helper functions for common error scenarios
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn invalid_document(msg: impl Into<String>) -> Self {
        AppError::InvalidDocument(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        AppError::Fetch(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// True for errors raised while constructing value objects
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::InvalidDocument(_) | AppError::InvalidPeriod { .. } | AppError::Validation(_)
        )
    }
}
