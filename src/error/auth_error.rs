use crate::error::store_error::StoreError;
use crate::error::token_error::TokenError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// The only credential failure callers ever see. Its message never
    /// depends on which check failed.
    #[error("Email or password is invalid")]
    InvalidCredentials,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Token(#[from] TokenError),
}
