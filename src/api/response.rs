//! Response types for the rota allocation API.
//!
//! This module defines the error response structures and error handling
//! for the HTTP API.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }

    /// Creates an internal error response for failures outside the engine.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }

    fn server_error(error: ApiError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            Json(self.error),
        )
            .into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        match error {
            EngineError::ConfigNotFound { path } => Self::server_error(ApiError::with_details(
                "CONFIG_ERROR",
                "Configuration error",
                format!("Configuration file not found: {}", path),
            )),
            EngineError::ConfigParseError { path, message } => {
                Self::server_error(ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration parse error",
                    format!("Failed to parse {}: {}", path, message),
                ))
            }
            EngineError::InvalidConfig { .. } => {
                Self::bad_request(ApiError::new("INVALID_CONFIG", message))
            }
            EngineError::EmptyInput { .. } => {
                Self::bad_request(ApiError::new("EMPTY_INPUT", message))
            }
            EngineError::DuplicateReference { .. } => {
                Self::bad_request(ApiError::new("DUPLICATE_REFERENCE", message))
            }
            EngineError::InvalidWeeks { .. } => {
                Self::bad_request(ApiError::new("INVALID_WEEKS", message))
            }
            EngineError::UnknownReference { .. } => Self::bad_request(ApiError::with_details(
                "UNKNOWN_REFERENCE",
                message,
                "Bids may only reference employees, duties and shifts in the request",
            )),
            EngineError::MissingBid { .. } => Self::bad_request(ApiError::with_details(
                "MISSING_BID",
                message,
                "Every employee must bid for every active shift category",
            )),
            EngineError::DuplicateBid { .. } => {
                Self::bad_request(ApiError::new("DUPLICATE_BID", message))
            }
            EngineError::InvalidBid { .. } => {
                Self::bad_request(ApiError::new("INVALID_BID", message))
            }
            EngineError::InternalConsistency { message } => {
                Self::server_error(ApiError::with_details(
                    "INTERNAL_CONSISTENCY",
                    "Allocation failed an internal consistency check",
                    message,
                ))
            }
        }
    }
}
