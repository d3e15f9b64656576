//! Bearer-token guard shared by every protected route.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use bookbuddy_http::AppError;
use uuid::Uuid;

use crate::{error::AuthzError, token::TokenService};

/// The authenticated caller.
///
/// Taking `AuthUser` as a handler argument is what makes a route protected:
/// the request is rejected with 401 before the handler runs unless it carries
/// a valid `Authorization: Bearer <token>` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

impl AuthUser {
    /// Self-access check for per-user resources.
    pub fn ensure_self(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.id == user_id {
            Ok(())
        } else {
            tracing::warn!(caller = %self.id, target_user = %user_id, "cross-user access refused");
            Err(AppError::forbidden("access denied"))
        }
    }

    /// [`Self::ensure_self`] for a raw path segment. Anything that is not the
    /// caller's own id is refused, malformed ids included.
    pub fn ensure_self_path(&self, raw: &str) -> Result<Uuid, AppError> {
        match Uuid::parse_str(raw) {
            Ok(id) => self.ensure_self(id).map(|()| id),
            Err(_) => {
                tracing::warn!(caller = %self.id, target_user = %raw, "cross-user access refused");
                Err(AppError::forbidden("access denied"))
            }
        }
    }
}

/// Pull the token out of an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthzError> {
    let header = header.ok_or(AuthzError::MissingToken)?;
    let (scheme, token) = header.split_once(' ').ok_or(AuthzError::MalformedHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthzError::MalformedHeader);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthzError::MissingToken);
    }
    Ok(token)
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(value.to_str().map_err(|_| AuthzError::MalformedHeader)?),
            None => None,
        };
        let token = bearer_token(header)?;

        let tokens = Arc::<TokenService>::from_ref(state);
        let claims = tokens.verify(token)?;

        tracing::debug!(user_id = %claims.sub, "bearer token accepted");
        Ok(AuthUser {
            id: claims.sub,
            username: claims.username,
        })
    }
}
