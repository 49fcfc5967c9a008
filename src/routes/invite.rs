use crate::handler::invite_handler;
use crate::state::invite_state::InviteState;
use axum::{
    Router,
    routing::{get, post},
};

/// Token-holder routes; the raw token is the credential.
pub fn public_routes() -> Router<InviteState> {
    Router::<InviteState>::new()
        .route("/invites/validate", get(invite_handler::validate))
        .route("/invites/redeem", post(invite_handler::redeem))
}

/// Management routes; callers layer the bearer guard and role gate on top.
pub fn managed_routes() -> Router<InviteState> {
    Router::<InviteState>::new()
        .route("/invites", post(invite_handler::create).get(invite_handler::list))
        .route("/invites/{id}", get(invite_handler::get).patch(invite_handler::update))
        .route("/invites/{id}/revoke", post(invite_handler::revoke))
}
