use crate::error::config_error::ConfigError;
use crate::error::hash_error::HashError;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use async_trait::async_trait;
use rand::rngs::OsRng;

/// Valid Argon2id digest of an unknowable secret, using the default cost
/// profile. Verified against when a login names an unknown email so both
/// paths cost one verification.
pub const DECOY_DIGEST: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// One-way hashing capability for passwords and invite tokens.
#[async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash(&self, secret: &str) -> Result<String, HashError>;
    async fn verify(&self, digest: &str, secret: &str) -> Result<bool, HashError>;
}

/// Argon2id hasher producing PHC strings.
///
/// Without a fixed salt every hash gets a fresh random salt (passwords). With
/// one, the digest of a given secret is stable and can be looked up by
/// equality (invite tokens).
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
    fixed_salt: Option<String>,
}

impl Argon2Hasher {
    pub fn salted() -> Self {
        Self {
            argon2: Argon2::default(),
            fixed_salt: None,
        }
    }

    /// `salt` is unpadded standard base64 of at least 8 bytes.
    pub fn with_fixed_salt(salt: &str) -> Result<Self, ConfigError> {
        let hasher = Self {
            argon2: Argon2::default(),
            fixed_salt: Some(salt.to_string()),
        };
        // Rejects salts argon2 would refuse at hash time.
        let parsed = SaltString::from_b64(salt).map_err(|e| invalid_salt(e.to_string()))?;
        hasher
            .argon2
            .hash_password(b"", &parsed)
            .map_err(|e| invalid_salt(e.to_string()))?;
        Ok(hasher)
    }

    /// Replaces the cost parameters, keeping Argon2id v0x13.
    pub fn with_params(mut self, params: Params) -> Self {
        self.argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        self
    }
}

fn invalid_salt(reason: String) -> ConfigError {
    ConfigError::Invalid {
        name: "INVITE_TOKEN_SALT".to_string(),
        reason,
    }
}

fn hash_blocking(
    argon2: &Argon2<'static>,
    fixed_salt: Option<&str>,
    secret: &str,
) -> Result<String, HashError> {
    let salt = match fixed_salt {
        Some(salt) => SaltString::from_b64(salt).map_err(|e| HashError::Hash(e.to_string()))?,
        None => SaltString::generate(&mut OsRng),
    };
    let digest = argon2
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| HashError::Hash(e.to_string()))?;
    Ok(digest.to_string())
}

fn verify_blocking(argon2: &Argon2<'static>, digest: &str, secret: &str) -> Result<bool, HashError> {
    let parsed = PasswordHash::new(digest).map_err(|e| HashError::MalformedDigest(e.to_string()))?;
    match argon2.verify_password(secret.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(HashError::Hash(e.to_string())),
    }
}

#[async_trait]
impl CredentialHasher for Argon2Hasher {
    async fn hash(&self, secret: &str) -> Result<String, HashError> {
        let argon2 = self.argon2.clone();
        let fixed_salt = self.fixed_salt.clone();
        let secret = secret.to_string();
        tokio::task::spawn_blocking(move || hash_blocking(&argon2, fixed_salt.as_deref(), &secret))
            .await
            .map_err(|e| HashError::Aborted(e.to_string()))?
    }

    async fn verify(&self, digest: &str, secret: &str) -> Result<bool, HashError> {
        let argon2 = self.argon2.clone();
        let digest = digest.to_string();
        let secret = secret.to_string();
        tokio::task::spawn_blocking(move || verify_blocking(&argon2, &digest, &secret))
            .await
            .map_err(|e| HashError::Aborted(e.to_string()))?
    }
}
