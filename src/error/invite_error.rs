use crate::error::hash_error::HashError;
use crate::error::store_error::StoreError;
use thiserror::Error;

/// Errors of the invite lifecycle.
///
/// `NotFound` covers "never existed", "already used", "revoked",
/// "expired" and "lost a race". Callers must not try to tell them apart.
#[derive(Error, Debug)]
pub enum InviteError {
    #[error("Invite not found")]
    NotFound,
    #[error("Invite lifetime of {0} seconds is out of range")]
    InvalidTtl(i64),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Hash(#[from] HashError),
}
