pub mod auth;
pub mod database;
pub mod invite;
pub mod logging;
pub mod parameter;
