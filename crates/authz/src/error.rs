use bookbuddy_http::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthzError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("malformed authorization header")]
    MalformedHeader,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    ExpiredToken,

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl From<AuthzError> for AppError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::MissingToken
            | AuthzError::MalformedHeader
            | AuthzError::InvalidToken
            | AuthzError::ExpiredToken => AppError::unauthorized(err.to_string()),
            AuthzError::Signing(_) | AuthzError::Hashing(_) => AppError::Internal(err.into()),
        }
    }
}
