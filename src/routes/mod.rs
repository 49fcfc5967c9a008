pub mod auth;
pub mod health;
pub mod invite;
pub mod root;
