use async_trait::async_trait;
use bookbuddy_kernel::{InitCtx, Module};

use crate::Database;

/// Core module owning the store lifecycle: report what is stored on init,
/// close the pool on stop.
pub struct DatabaseModule {
    db: Database,
}

impl DatabaseModule {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl Module for DatabaseModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let collections = self.db.stats().await?;
        tracing::info!(
            target: "bookbuddy-db",
            url = %ctx.settings.database.url,
            ?collections,
            "document store ready"
        );
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.db.close().await;
        tracing::info!(target: "bookbuddy-db", "document store closed");
        Ok(())
    }
}
