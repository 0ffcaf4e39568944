//! API errors
//!
//! Every failure a handler can hit, and how it turns into a response. Error
//! bodies look like `{"error": "<kind>", "message": "<text>"}`, with a
//! `details` list for validation failures.

use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use notes_core::{FieldError, StorageError, ValidationErrors};

use crate::body::DecodeError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Note not found")]
    NotFound,

    #[error("Route not found")]
    RouteNotFound,

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Request body not received within {0:?}")]
    Timeout(Duration),

    #[error("Store failure: {0}")]
    Store(#[from] StorageError),
}

#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a [FieldError]>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Decode(DecodeError::UnsupportedMediaType(_)) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ApiError::Decode(DecodeError::PayloadTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Decode(DecodeError::MalformedBody(_))
            | ApiError::Decode(DecodeError::TransportError(_)) => StatusCode::BAD_REQUEST,
            ApiError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::NotFound => "not_found",
            ApiError::RouteNotFound => "route_not_found",
            ApiError::Validation(_) => "validation_failed",
            ApiError::Decode(DecodeError::UnsupportedMediaType(_)) => "unsupported_media_type",
            ApiError::Decode(DecodeError::PayloadTooLarge { .. }) => "payload_too_large",
            ApiError::Decode(DecodeError::MalformedBody(_)) => "malformed_body",
            ApiError::Decode(DecodeError::TransportError(_)) => "transport_error",
            ApiError::Timeout(_) => "request_timeout",
            ApiError::Store(_) => "internal_error",
        }
    }

    /// Text shown to the client; store details stay in the logs
    fn public_message(&self) -> String {
        match self {
            ApiError::Validation(_) => "Request body failed validation".to_string(),
            ApiError::Store(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the rest of the request body was left unread
    fn closes_connection(&self) -> bool {
        matches!(
            self,
            ApiError::Decode(DecodeError::PayloadTooLarge { .. })
                | ApiError::Decode(DecodeError::TransportError(_))
                | ApiError::Timeout(_)
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Store(e) => {
                tracing::error!("Store failure: {}", e);
                if let Some(hint) = e.recovery_suggestion() {
                    tracing::error!("Hint: {}", hint);
                }
            }
            ApiError::Decode(DecodeError::TransportError(e)) => {
                tracing::debug!("Body stream failed: {}", e);
            }
            _ => {}
        }

        let body = ErrorResponse {
            error: self.kind(),
            message: self.public_message(),
            details: match &self {
                ApiError::Validation(errors) => Some(errors.errors()),
                _ => None,
            },
        };

        let mut response = (self.status(), Json(body)).into_response();
        if self.closes_connection() {
            response
                .headers_mut()
                .insert(header::CONNECTION, HeaderValue::from_static("close"));
        }
        response
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
