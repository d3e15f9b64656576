//! Shared handles every route module pulls from.

use std::sync::Arc;

use axum::extract::FromRef;
use bookbuddy_authz::{PasswordHasher, TokenService};
use bookbuddy_db::Database;
use bookbuddy_kernel::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub tokens: Arc<TokenService>,
    pub hasher: PasswordHasher,
}

impl AppState {
    pub fn new(settings: &Settings, db: Database) -> Self {
        Self {
            db,
            tokens: Arc::new(TokenService::from_settings(&settings.auth)),
            hasher: PasswordHasher::new((&settings.auth).into()),
        }
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
