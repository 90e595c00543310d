use anyhow::Result;
use clap::Parser;
use dropme::cli::Cli;
use dropme::commands::Context;
use dropme::dropbox::Dropbox;
use dropme::provider::{ProviderConfig, StorageProvider};
use dropme::settings::{default_sources, load_settings, resolve_token};
use std::io::Write;
use tracing::debug;
use tracing_subscriber::filter::EnvFilter;

async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(
        &default_sources(cli.config.as_deref()),
        cli.token.is_some(),
    )?;
    let token = resolve_token(cli.token.as_deref(), &settings)?;
    debug!(?settings, "settings resolved");

    let provider = Dropbox::load_from_config(ProviderConfig { token }).await?;
    let output = cli
        .command
        .execute(&provider, &Context::from(&settings))
        .await?;

    let mut stdout = std::io::stdout().lock();
    output.render(cli.format, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
