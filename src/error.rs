use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::accounts::{dto::MessageResponse, tokens::TokenPurpose};

/// Every way an account operation can fail.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Invalid(&'static str),

    #[error("User already exists")]
    Conflict,

    #[error("User not found")]
    NotFound,

    #[error("Account not verified")]
    Unverified,

    #[error("Wrong password")]
    WrongPassword,

    #[error("{}", .0.invalid_message())]
    InvalidToken(TokenPurpose),

    #[error("{}", .0.expired_message())]
    Expired(TokenPurpose),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AccountError {
    pub fn status(&self) -> StatusCode {
        match self {
            AccountError::Invalid(_)
            | AccountError::Conflict
            | AccountError::WrongPassword
            | AccountError::InvalidToken(_)
            | AccountError::Expired(_) => StatusCode::BAD_REQUEST,
            AccountError::NotFound => StatusCode::NOT_FOUND,
            AccountError::Unverified => StatusCode::FORBIDDEN,
            AccountError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let message = match &self {
            AccountError::Internal(e) => {
                error!(error = ?e, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (self.status(), Json(MessageResponse { message })).into_response()
    }
}
