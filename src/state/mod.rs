pub mod auth_state;
pub mod health_state;
pub mod invite_state;
