//! JWT bearer token creation and verification.

use std::time::Duration;

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use bookbuddy_kernel::settings::AuthSettings;

use crate::error::AuthzError;

/// Claims carried by every issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,        // User id
    pub username: String, // Username at issue time
    pub iat: i64,         // Issued at
    pub exp: i64,         // Expiration time
}

/// Issues and verifies HS256 tokens with a fixed lifetime.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(
            &settings.jwt_secret,
            Duration::from_secs(settings.token_ttl_hours * 60 * 60),
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<String, AuthzError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };
        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, AuthzError> {
        encode(&Header::default(), claims, &self.encoding).map_err(|e| AuthzError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthzError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthzError::ExpiredToken,
                // Anything a client can send us is an auth failure, not a server fault.
                _ => AuthzError::InvalidToken,
            })
    }
}
