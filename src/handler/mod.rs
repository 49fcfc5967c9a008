pub mod auth_handler;
pub mod health_handler;
pub mod invite_handler;
