use anyhow::Result;
use clap::Parser;
use tierline_cli::{execute, load_config, Cli};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays parseable JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tierline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    tracing::debug!(root = %config.data.root.display(), "configuration loaded");

    let output = execute(&config, &cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
