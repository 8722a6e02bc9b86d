use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use edubot_shared::protocol::ErrorResponse;
use edubot_store::StoreError;

use crate::auth::guard::SessionFailure;
use crate::auth::token::TokenError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Session rejected: {0}")]
    Session(#[from] SessionFailure),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Tutor error: {0}")]
    Tutor(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message, code) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            ServerError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            ServerError::Session(failure) => (
                failure.status(),
                failure.to_string(),
                Some(failure.code().to_string()),
            ),
            ServerError::Store(_)
            | ServerError::Token(_)
            | ServerError::Tutor(_)
            | ServerError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        (status, axum::Json(ErrorResponse { message, code })).into_response()
    }
}
