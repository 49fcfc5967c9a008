pub mod auth_error;
pub mod authorization_error;
pub mod config_error;
pub mod hash_error;
pub mod invite_error;
pub mod request_error;
pub mod store_error;
pub mod token_error;

use crate::config::logging::secure_log;
use crate::response::app_response::{ErrorDetail, ErrorResponse};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

// Unified application error type
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] auth_error::AuthError),
    #[error(transparent)]
    Authorization(#[from] authorization_error::AuthorizationError),
    #[error(transparent)]
    Invite(#[from] invite_error::InviteError),
    #[error(transparent)]
    Token(#[from] token_error::TokenError),
    #[error(transparent)]
    Request(#[from] request_error::RequestError),
    #[error(transparent)]
    Store(#[from] store_error::StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        use auth_error::AuthError;
        use invite_error::InviteError;

        let status = match &self {
            AppError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            AppError::Auth(AuthError::Token(e)) | AppError::Token(e) if !e.is_infrastructure() => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::Invite(InviteError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Invite(InviteError::InvalidTtl(_)) => StatusCode::BAD_REQUEST,
            AppError::Request(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match self {
            AppError::Request(e) => e.into_response(),
            AppError::Authorization(e) => ErrorResponse::with_error_details(
                "Access denied".to_string(),
                vec![ErrorDetail::new("AUTHORIZATION_ERROR".to_string(), e.to_string())],
            )
            .with_status(status)
            .into_response(),
            e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                // Details stay in the logs.
                secure_log::secure_error!("Request failed with infrastructure error", e);
                ErrorResponse::send("Internal server error".to_string())
                    .with_status(status)
                    .into_response()
            }
            e => ErrorResponse::send(e.to_string()).with_status(status).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::store_error::StoreError;

    #[test]
    fn test_status_mapping() {
        let cases: Vec<(AppError, StatusCode)> = vec![
            (auth_error::AuthError::InvalidCredentials.into(), StatusCode::UNAUTHORIZED),
            (token_error::TokenError::MissingToken.into(), StatusCode::UNAUTHORIZED),
            (
                token_error::TokenError::Signing("boom".to_string()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (invite_error::InviteError::NotFound.into(), StatusCode::NOT_FOUND),
            (
                authorization_error::AuthorizationError::MissingPrincipal.into(),
                StatusCode::FORBIDDEN,
            ),
            (
                StoreError::Unavailable("down".to_string()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                invite_error::InviteError::Store(StoreError::Unavailable("down".to_string())).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
