//! Password hashing and verification.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use bookbuddy_kernel::settings::AuthSettings;

use crate::error::AuthzError;

/// Argon2id hashing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    /// Smallest parameters argon2 accepts. Tests only.
    pub const fn minimal() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn to_argon2(self) -> Result<Argon2<'static>, AuthzError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| AuthzError::Hashing(format!("argon2 params: {e}")))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self::from(&AuthSettings::default())
    }
}

impl From<&AuthSettings> for Argon2Params {
    fn from(settings: &AuthSettings) -> Self {
        Self {
            memory_kib: settings.argon2_memory_kib,
            iterations: settings.argon2_iterations,
            parallelism: settings.argon2_parallelism,
        }
    }
}

/// Salted argon2id hasher.
///
/// The async methods run on the blocking pool; hashing is deliberately slow.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher {
    params: Argon2Params,
}

impl PasswordHasher {
    pub fn new(params: Argon2Params) -> Self {
        Self { params }
    }

    pub fn params(&self) -> Argon2Params {
        self.params
    }

    /// Hash `password` into a PHC string with a fresh random salt.
    pub fn hash_blocking(&self, password: &str) -> Result<String, AuthzError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .params
            .to_argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthzError::Hashing(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Check `password` against a stored PHC string.
    ///
    /// Verification uses the parameters embedded in the hash, not `self.params`.
    pub fn verify_blocking(password: &str, hash: &str) -> Result<bool, AuthzError> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthzError::Hashing(format!("parse hash: {e}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    pub async fn hash(&self, password: String) -> Result<String, AuthzError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash_blocking(&password))
            .await
            .map_err(|e| AuthzError::Hashing(format!("hashing task: {e}")))?
    }

    pub async fn verify(&self, password: String, hash: String) -> Result<bool, AuthzError> {
        tokio::task::spawn_blocking(move || Self::verify_blocking(&password, &hash))
            .await
            .map_err(|e| AuthzError::Hashing(format!("verification task: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(Argon2Params::minimal())
    }

    #[test]
    fn test_password_hashing() {
        let hash = hasher().hash_blocking("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(PasswordHasher::verify_blocking("correct horse", &hash).unwrap());
        assert!(!PasswordHasher::verify_blocking("battery staple", &hash).unwrap());
    }

    #[test]
    fn test_same_input_different_hashes() {
        let first = hasher().hash_blocking("same_password").unwrap();
        let second = hasher().hash_blocking("same_password").unwrap();

        // Salted, so never equal
        assert_ne!(first, second);
        assert!(PasswordHasher::verify_blocking("same_password", &first).unwrap());
        assert!(PasswordHasher::verify_blocking("same_password", &second).unwrap());
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(PasswordHasher::verify_blocking("pw", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        let broken = PasswordHasher::new(Argon2Params {
            memory_kib: 0,
            iterations: 0,
            parallelism: 0,
        });
        assert!(matches!(
            broken.hash_blocking("pw"),
            Err(AuthzError::Hashing(_))
        ));
    }

    #[test]
    fn test_params_follow_settings() {
        let settings = AuthSettings {
            argon2_memory_kib: 4096,
            ..AuthSettings::default()
        };
        assert_eq!(Argon2Params::from(&settings).memory_kib, 4096);
    }

    #[tokio::test]
    async fn test_async_round_trip() {
        let hasher = hasher();
        let hash = hasher.hash("pw".to_string()).await.unwrap();
        assert!(hasher.verify("pw".to_string(), hash.clone()).await.unwrap());
        assert!(!hasher.verify("nope".to_string(), hash).await.unwrap());
    }
}
