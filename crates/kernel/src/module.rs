use async_trait::async_trait;
use axum::Router;

use crate::settings::Settings;

/// Passed to every lifecycle hook.
pub struct InitCtx<'a> {
    pub settings: &'a Settings,
}

/// A unit of the application with its own routes, API docs and lifecycle.
///
/// Modules hold whatever shared handles they need (store, token service)
/// from construction; the hooks only see settings.
#[async_trait]
pub trait Module: Sync + Send {
    /// Mount point and log label. Must be unique within a registry.
    fn name(&self) -> &'static str;

    /// Validate configuration and restore state. Every module is
    /// initialised before any module is started.
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Routes served under `{base_path}/{name}`
    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment with `paths` relative to the mount point and
    /// optional `components.schemas`
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Flush and release resources on shutdown
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
