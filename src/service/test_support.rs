use crate::error::hash_error::HashError;
use crate::error::token_error::TokenError;
use crate::service::hasher::CredentialHasher;
use crate::service::token_service::TokenSigner;
use async_trait::async_trait;
use chrono::Duration;
use serde_json::{Map, Value};
use std::sync::Mutex;

/// Cheap deterministic hasher that records every `verify` call.
///
/// `hash(s)` is `"digest:" + s`. Digests starting with `malformed` make
/// `verify` fail the way a corrupt PHC string would.
#[derive(Default)]
pub struct RecordingHasher {
    pub verify_calls: Mutex<Vec<(String, String)>>,
}

impl RecordingHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn digest_of(secret: &str) -> String {
        format!("digest:{secret}")
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.verify_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialHasher for RecordingHasher {
    async fn hash(&self, secret: &str) -> Result<String, HashError> {
        Ok(Self::digest_of(secret))
    }

    async fn verify(&self, digest: &str, secret: &str) -> Result<bool, HashError> {
        self.verify_calls
            .lock()
            .unwrap()
            .push((digest.to_string(), secret.to_string()));
        if digest.starts_with("malformed") {
            return Err(HashError::MalformedDigest(digest.to_string()));
        }
        Ok(digest == Self::digest_of(secret))
    }
}

/// Signer that always fails, as an unreachable key service would.
pub struct FailingSigner;

#[async_trait]
impl TokenSigner for FailingSigner {
    async fn sign(&self, _: Value, _: &str, _: Duration) -> Result<String, TokenError> {
        Err(TokenError::Signing("key service unavailable".to_string()))
    }

    async fn verify(&self, _: &str, _: &str) -> Result<Map<String, Value>, TokenError> {
        Err(TokenError::Signing("key service unavailable".to_string()))
    }
}
