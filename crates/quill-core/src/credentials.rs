use anyhow::{Result, anyhow};
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::config::HashParams;

/// Salted Argon2id hashing for passwords and security answers.
pub struct Hasher {
    argon2: Argon2<'static>,
}

impl Hasher {
    pub fn new(params: HashParams) -> Result<Self> {
        let params = Params::new(params.memory_kib, params.iterations, params.lanes, None)
            .map_err(|e| anyhow!("invalid argon2 parameters: {e}"))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// PHC string with a fresh random salt.
    pub fn hash(&self, secret: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| anyhow!("password hashing failed: {e}"))?;
        Ok(hash.to_string())
    }

    /// Cost parameters are read from the stored string, so hashes made under
    /// older settings keep verifying.
    pub fn verify(&self, secret: &str, stored: &str) -> bool {
        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Unparseable credential hash: {e}");
                return false;
            }
        };

        self.argon2.verify_password(secret.as_bytes(), &parsed).is_ok()
    }
}

/// Security answers compare trimmed and case-insensitively.
pub fn normalize_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// 32 random bytes, URL-safe base64. Handed to the requester only.
pub fn new_reset_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// What gets persisted in place of a reset token.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
