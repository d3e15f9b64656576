//! Authentication primitives and the request guard.
//!
//! - [`password`]: argon2id hashing, run on the blocking pool
//! - [`token`]: HS256 bearer tokens carrying the user id
//! - [`guard`]: the [`AuthUser`] extractor every protected route takes
//! - [`module`]: core module that validates auth settings at startup

pub mod error;
pub mod guard;
pub mod module;
pub mod password;
pub mod token;

pub use error::AuthzError;
pub use guard::AuthUser;
pub use module::AuthzModule;
pub use password::{Argon2Params, PasswordHasher};
pub use token::{Claims, TokenService};
