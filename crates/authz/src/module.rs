use anyhow::bail;
use async_trait::async_trait;
use bookbuddy_kernel::{
    settings::{Environment, DEV_JWT_SECRET},
    InitCtx, Module,
};

use crate::password::Argon2Params;

const MIN_SECRET_LEN: usize = 16;

/// Core module validating authentication settings before anything is served.
pub struct AuthzModule;

impl AuthzModule {
    pub const fn new() -> Self {
        Self
    }
}

impl Default for AuthzModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for AuthzModule {
    fn name(&self) -> &'static str {
        "authz"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let auth = &ctx.settings.auth;

        if auth.jwt_secret == DEV_JWT_SECRET {
            if ctx.settings.environment == Environment::Production {
                bail!("auth.jwt_secret must be set in production");
            }
            tracing::warn!(
                environment = ?ctx.settings.environment,
                "using the development JWT secret"
            );
        } else if auth.jwt_secret.len() < MIN_SECRET_LEN {
            bail!("auth.jwt_secret must be at least {MIN_SECRET_LEN} bytes");
        }

        if auth.token_ttl_hours == 0 {
            bail!("auth.token_ttl_hours must be positive");
        }

        // Fail fast on parameters argon2 would reject at the first registration.
        crate::PasswordHasher::new(Argon2Params::from(auth))
            .hash("startup-check".to_string())
            .await?;

        tracing::info!(
            module = self.name(),
            token_ttl_hours = auth.token_ttl_hours,
            "authorization configured"
        );
        Ok(())
    }
}
