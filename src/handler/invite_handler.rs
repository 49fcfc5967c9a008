use crate::dto::invite_dto::{
    CreateInviteDto, InviteReadDto, InviteTokenQuery, IssuedInviteDto, RedeemInviteDto, UpdateInviteDto,
};
use crate::dto::token_dto::AccessTokenPayload;
use crate::entity::invite::InvitePatch;
use crate::error::AppError;
use crate::error::invite_error::InviteError;
use crate::error::request_error::{RequestError, ValidatedRequest};
use crate::response::app_response::SuccessResponse;
use crate::state::invite_state::InviteState;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Extension, Path, Query, State};
use axum::response::IntoResponse;
use chrono::Duration;
use tracing::info;
use uuid::Uuid;

fn invite_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    let Path(id) = path.map_err(RequestError::from)?;
    Ok(id)
}

pub async fn create(
    State(state): State<InviteState>,
    Extension(principal): Extension<AccessTokenPayload>,
    ValidatedRequest(payload): ValidatedRequest<CreateInviteDto>,
) -> Result<impl IntoResponse, AppError> {
    let ttl = payload
        .expires_in_hours
        .map(|hours| Duration::hours(i64::from(hours)))
        .unwrap_or(state.default_ttl);

    let (invite, token) = state
        .invite_service
        .issue(
            payload.email.trim().to_string(),
            payload.first_name,
            payload.last_name,
            payload.role,
            ttl,
        )
        .await?;

    info!("Invite {} issued by user ID: {}", invite.id, principal.sub);
    Ok(SuccessResponse::created(IssuedInviteDto {
        invite: invite.into(),
        token,
    }))
}

pub async fn list(State(state): State<InviteState>) -> Result<impl IntoResponse, AppError> {
    let invites: Vec<InviteReadDto> = state
        .invite_service
        .list_all()
        .await?
        .into_iter()
        .map(InviteReadDto::from)
        .collect();
    Ok(SuccessResponse::send(invites))
}

pub async fn get(
    State(state): State<InviteState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let invite = state.invite_service.get_by_id(invite_id(path)?).await?;
    Ok(SuccessResponse::send(InviteReadDto::from(invite)))
}

pub async fn update(
    State(state): State<InviteState>,
    path: Result<Path<Uuid>, PathRejection>,
    ValidatedRequest(payload): ValidatedRequest<UpdateInviteDto>,
) -> Result<impl IntoResponse, AppError> {
    let patch = InvitePatch::from(payload);
    let invite = state.invite_service.update(invite_id(path)?, &patch).await?;
    Ok(SuccessResponse::send(InviteReadDto::from(invite)))
}

pub async fn revoke(
    State(state): State<InviteState>,
    Extension(principal): Extension<AccessTokenPayload>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let invite = state.invite_service.revoke(invite_id(path)?).await?;
    info!("Invite {} revoked by user ID: {}", invite.id, principal.sub);
    Ok(SuccessResponse::send(InviteReadDto::from(invite)))
}

/// Public: checks a raw token without consuming it.
pub async fn validate(
    State(state): State<InviteState>,
    query: Result<Query<InviteTokenQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query.map_err(RequestError::from)?;
    if query.token.is_empty() {
        return Err(InviteError::NotFound.into());
    }
    let invite = state.invite_service.find_valid_by_raw_token(&query.token).await?;
    Ok(SuccessResponse::send(InviteReadDto::from(invite)))
}

/// Public: consumes a raw token. Succeeds at most once per invite.
pub async fn redeem(
    State(state): State<InviteState>,
    ValidatedRequest(payload): ValidatedRequest<RedeemInviteDto>,
) -> Result<impl IntoResponse, AppError> {
    if payload.token.is_empty() {
        return Err(InviteError::NotFound.into());
    }
    let invite = state.invite_service.redeem(&payload.token).await?;
    Ok(SuccessResponse::send(InviteReadDto::from(invite)))
}
