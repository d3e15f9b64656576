use anyhow::Context;
use bookbuddy_db::Database;
use bookbuddy_kernel::settings::Settings;
use clap::{Parser, Subcommand};

const REDACTED: &str = "<redacted>";

#[derive(Parser, Debug)]
#[command(author, version, about = "BookBuddy reading tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the HTTP server until Ctrl-C or SIGTERM
    Serve,
    /// Print the merged OpenAPI document
    Openapi,
    /// Print the effective settings with secrets redacted
    Config,
}

fn redacted(settings: &Settings) -> anyhow::Result<serde_json::Value> {
    let mut value = serde_json::to_value(settings).context("failed to serialize settings")?;
    value["auth"]["jwt_secret"] = REDACTED.into();
    Ok(value)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().context("failed to load BookBuddy settings")?;

    match cli.command {
        Command::Serve => {
            bookbuddy_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "bookbuddy-cli serving");
            bookbuddy_app::run(settings).await
        }
        Command::Openapi => {
            // The schema is static, so an empty in-memory store is enough.
            let app = bookbuddy_app::build_app(&settings, Database::in_memory().await?)?;
            let doc = bookbuddy_http::router::merged_openapi(
                &app.registry,
                &settings.server.base_path,
            );
            println!("{}", serde_json::to_string_pretty(&doc)?);
            Ok(())
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&redacted(&settings)?)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from(["bookbuddy-cli", "openapi"]).unwrap();
        assert_eq!(cli.command, Command::Openapi);
        assert!(Cli::try_parse_from(["bookbuddy-cli"]).is_err());
        assert!(Cli::try_parse_from(["bookbuddy-cli", "migrate"]).is_err());
    }

    #[test]
    fn config_output_hides_the_secret() {
        let value = redacted(&Settings::default()).unwrap();
        assert_eq!(value["auth"]["jwt_secret"], REDACTED);
        assert_eq!(value["server"]["port"], 5000);
    }
}
