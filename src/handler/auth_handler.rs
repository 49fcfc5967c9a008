use crate::dto::user_dto::UserLoginDto;
use crate::error::AppError;
use crate::error::request_error::ValidatedRequest;
use crate::response::app_response::SuccessResponse;
use crate::state::auth_state::AuthState;
use axum::extract::State;
use axum::response::IntoResponse;
use tracing::info;

pub async fn login(
    State(state): State<AuthState>,
    ValidatedRequest(payload): ValidatedRequest<UserLoginDto>,
) -> Result<impl IntoResponse, AppError> {
    info!("Login attempt");
    let tokens = state.auth_service.login(&payload.email, &payload.password).await?;
    Ok(SuccessResponse::send(tokens))
}
