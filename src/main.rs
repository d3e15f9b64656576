use anyhow::Context;
use bookbuddy_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load BookBuddy settings")?;
    bookbuddy_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        database = %settings.database.url,
        "bookbuddy starting"
    );

    bookbuddy_app::run(settings).await
}
