use crate::config::logging::secure_log;
use crate::dto::token_dto::AccessTokenPayload;
use crate::error::AppError;
use crate::error::authorization_error::AuthorizationError;
use crate::error::token_error::TokenError;
use crate::state::auth_state::AuthState;
use axum::extract::State;
use axum::{http, http::Request, middleware::Next, response::IntoResponse};
use tracing::info;

/// Bearer guard. Verifies the access token and stores its payload in the
/// request extensions for the handlers and [`require_invite_manager`].
pub async fn auth(
    State(state): State<AuthState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, AppError> {
    let client_ip = req
        .headers()
        .get("x-forwarded-for")
        .or_else(|| req.headers().get("x-real-ip"))
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let token = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .ok_or_else(|| {
            secure_log::secure_error!(format!("Missing authorization header from IP: {client_ip}"));
            TokenError::MissingToken
        })?;

    if token.is_empty() {
        secure_log::secure_error!(format!("Empty authorization token from IP: {client_ip}"));
        return Err(TokenError::MissingToken.into());
    }

    let payload = state.auth_service.verify_access_token(&token).await.map_err(|e| {
        secure_log::secure_error!("SECURITY: Rejected access token from IP: {}: {}", client_ip, e);
        e
    })?;

    info!("SECURITY: Authenticated user ID: {} from IP: {}", payload.sub, client_ip);
    req.extensions_mut().insert(payload);
    Ok(next.run(req).await)
}

/// Role gate for invite management. Must run after [`auth`].
pub async fn require_invite_manager(
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, AppError> {
    let payload = req
        .extensions()
        .get::<AccessTokenPayload>()
        .ok_or(AuthorizationError::MissingPrincipal)?;

    if !payload.role.can_manage_invites() {
        secure_log::secure_error!(
            "SECURITY: Access denied for user ID: {} with role {}",
            payload.sub,
            payload.role
        );
        return Err(AuthorizationError::AccessDenied {
            message: format!("role '{}' cannot manage invites", payload.role),
        }
        .into());
    }

    Ok(next.run(req).await)
}
