pub mod invite_repository;
pub mod user_repository;
