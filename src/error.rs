use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::utils::StateError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not authenticated, visit /auth/login first")]
    NotAuthenticated,

    #[error("{0}")]
    BadRequest(String),

    #[error("invalid OAuth state: {0}")]
    InvalidState(#[from] StateError),

    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("{service} returned {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

// Extractor rejections go through the same JSON error body as every other failure.
impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_)
            | AppError::InvalidState(_)
            | AppError::AuthorizationDenied(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream { .. }
            | AppError::Http(_)
            | AppError::Json(_)
            | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotAuthenticated => "not_authenticated",
            AppError::BadRequest(_) => "bad_request",
            AppError::InvalidState(_) => "invalid_state",
            AppError::AuthorizationDenied(_) => "authorization_denied",
            AppError::Upstream { .. } => "upstream_error",
            AppError::Http(_) => "request_failed",
            AppError::Json(_) => "malformed_json",
            AppError::Config(_) => "configuration_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(err = %self, "request failed");
        } else {
            tracing::warn!(err = %self, "request rejected");
        }

        (
            status,
            Json(json!({
                "error": self.code(),
                "details": self.to_string(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_errors_map_to_500_and_keep_the_upstream_text() {
        let err = AppError::Upstream {
            service: "spotify",
            status: 403,
            body: "{\"error\":\"insufficient scope\"}".to_string(),
        };

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("insufficient scope"));
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn client_side_problems_map_to_400() {
        assert_eq!(
            AppError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidState(StateError::Expired).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::AuthorizationDenied("access_denied".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotAuthenticated.status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
