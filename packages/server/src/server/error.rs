//! HTTP mapping for `AppError`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::common::{AppError, AuthError};

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::Rejected => StatusCode::UNAUTHORIZED,
            AppError::Delivery(_) => StatusCode::BAD_GATEWAY,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Auth(auth) => match auth {
                AuthError::SignInRequired | AuthError::SessionEnded => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::AdminRequired | AuthError::PermissionDenied(_) => StatusCode::FORBIDDEN,
                AuthError::Lookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text safe to show the caller. Infrastructure detail stays in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::Delivery(_) => {
                "Failed to deliver verification code. Please try again.".to_string()
            }
            AppError::Database(_)
            | AppError::Internal(_)
            | AppError::Auth(AuthError::Lookup(_)) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "success": false,
            "error": self.public_message(),
        }));
        (status, body).into_response()
    }
}
