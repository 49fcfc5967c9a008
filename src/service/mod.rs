pub mod auth_service;
pub mod hasher;
pub mod invite_service;
#[cfg(test)]
pub mod test_support;
pub mod token_service;
