use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Invalid token")]
    InvalidToken(String),
    #[error("Token has expired")]
    TokenExpired,
    #[error("Missing Bearer token")]
    MissingToken,
    #[error("Unexpected token type: {0}")]
    WrongTokenType(String),
    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl TokenError {
    /// Signing failures are infrastructure errors; everything else is a
    /// rejected credential.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, TokenError::Signing(_))
    }
}
