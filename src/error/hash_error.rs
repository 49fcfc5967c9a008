use thiserror::Error;

#[derive(Error, Debug)]
pub enum HashError {
    #[error("Hashing failed: {0}")]
    Hash(String),
    #[error("Malformed digest: {0}")]
    MalformedDigest(String),
    #[error("Hashing task aborted: {0}")]
    Aborted(String),
}
