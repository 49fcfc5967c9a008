use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthorizationError {
    #[error("Access denied: {message}")]
    AccessDenied { message: String },
    #[error("Missing authenticated principal")]
    MissingPrincipal,
}
