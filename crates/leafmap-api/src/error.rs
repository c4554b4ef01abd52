use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use leafmap_core::LeafError;
use serde::Serialize;

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), details: None }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.message, details: self.details };
        (self.status, Json(body)).into_response()
    }
}

impl From<LeafError> for ApiError {
    fn from(err: LeafError) -> Self {
        let message = err.to_string();
        match &err {
            LeafError::DistrictNotFound { .. }
            | LeafError::BlockNotFound { .. }
            | LeafError::GpNotFound { .. }
            | LeafError::FeatureNotFound { .. }
            | LeafError::FilterNotFound { .. }
            | LeafError::InterventionNotFound { .. } => Self::not_found(message),

            LeafError::InvalidUrl { .. }
            | LeafError::GpDataUnavailable { .. }
            | LeafError::DuplicateFilter { .. }
            | LeafError::BoundLocked { .. }
            | LeafError::InvalidRange { .. }
            | LeafError::InterventionNotSelected
            | LeafError::MalformedConfig { .. } => Self::bad_request(message),

            LeafError::Unsupported { .. } => Self::new(StatusCode::NOT_IMPLEMENTED, message),

            LeafError::Transport { .. } | LeafError::Timeout { .. } | LeafError::Backend { .. } => {
                Self::bad_gateway("Scoring service request failed").with_details(message)
            }

            _ => Self::internal("Internal error").with_details(message),
        }
    }
}
