//! Wiring: registry, shared state and the serve loop.

use std::sync::Arc;

use anyhow::Context;
use bookbuddy_authz::AuthzModule;
use bookbuddy_db::{Database, DatabaseModule};
use bookbuddy_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::{modules, state::AppState};

pub struct App {
    pub registry: ModuleRegistry,
    pub state: AppState,
}

/// Register core modules in their fixed order, then the application modules.
pub fn build_app(settings: &Settings, db: Database) -> anyhow::Result<App> {
    let state = AppState::new(settings, db.clone());

    let mut registry = ModuleRegistry::new();
    registry.register_core(Arc::new(DatabaseModule::new(db)))?;
    registry.register_core(Arc::new(AuthzModule::new()))?;
    modules::register_all(&mut registry, &state);

    tracing::debug!(
        core = registry.core_module_count(),
        custom = registry.custom_module_count(),
        "modules registered"
    );
    Ok(App { registry, state })
}

/// Init and start every module, serve until a shutdown signal, then stop.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let db = Database::connect(&settings.database)
        .await
        .with_context(|| format!("failed to open {}", settings.database.url))?;
    let app = build_app(&settings, db)?;
    let registry = &app.registry;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry
        .init_core_modules(&ctx)
        .await
        .context("core module init failed")?;
    registry
        .init_custom_modules(&ctx)
        .await
        .context("module init failed")?;
    registry.start_core_modules(&ctx).await?;
    registry.start_custom_modules(&ctx).await?;

    let served =
        bookbuddy_http::start_server(registry, &settings, bookbuddy_http::shutdown_signal()).await;

    // Stop even when serving failed so the pool is closed cleanly.
    let stopped = async {
        registry.stop_custom_modules().await?;
        registry.stop_core_modules().await
    }
    .await;

    served?;
    stopped.context("module shutdown failed")
}
