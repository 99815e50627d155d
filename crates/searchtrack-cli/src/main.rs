//! SearchTrack CLI entry point.

use clap::Parser;
use searchtrack_cli::{run, Cli};
use searchtrack_core::config::LogLevel;
use searchtrack_core::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Logging settings come from the config file when it parses; a broken
    // config is reported by the command itself.
    let logging = Config::load_or_default(cli.config.as_deref())
        .map(|c| c.logging)
        .unwrap_or_default();

    let level = match cli.verbose {
        0 => logging.level,
        1 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("searchtrack={}", level.as_str()).into());
    let (json, plain) = if logging.json {
        (
            Some(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
            None,
        )
    } else {
        (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();

    // Run the command
    run(cli).await
}
