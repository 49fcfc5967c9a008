pub mod invite;
pub mod role;
pub mod user;
