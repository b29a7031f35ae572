//! Response envelope `{success, data?, error?, details?}` and the status
//! mapping for [`GovernanceError`].

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use crate::error::GovernanceError;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Successful response carrying `data`.
pub struct ApiResponse<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let body = Envelope {
            success: true,
            data: Some(self.0),
            error: None,
            details: None,
        };
        (StatusCode::OK, Json(body)).into_response()
    }
}

#[derive(Debug)]
pub struct ApiError(pub GovernanceError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GovernanceError::ValidationError(_) => StatusCode::BAD_REQUEST,
            GovernanceError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            GovernanceError::PermissionError(_) => StatusCode::FORBIDDEN,
            GovernanceError::NotFound(_) => StatusCode::NOT_FOUND,
            GovernanceError::StateError(_) => StatusCode::CONFLICT,
            GovernanceError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            GovernanceError::DatabaseError(_) | GovernanceError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected ({}): {}", status.as_u16(), self.0);
        }

        let body: Envelope<()> = Envelope {
            success: false,
            data: None,
            error: Some(self.0.to_string()),
            details: Some(serde_json::json!({"kind": self.0.kind()})),
        };
        (status, Json(body)).into_response()
    }
}

impl From<GovernanceError> for ApiError {
    fn from(err: GovernanceError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(GovernanceError::ValidationError(rejection.body_text()))
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;
