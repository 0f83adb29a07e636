//! Animagen CLI entry point.

use animagen::cli::{commands, Cli, Commands};
use animagen::config::Settings;
use animagen::AnimagenError;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("animagen={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(cli).await {
        Err(e) if matches!(e.downcast_ref::<AnimagenError>(), Some(AnimagenError::IndexUnavailable(_))) => {
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
        result => result,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref().map(PathBuf::from);
    let settings = Settings::load_from(config_path.as_ref())?;

    std::fs::create_dir_all(settings.data_dir())?;

    match cli.command {
        Commands::Generate { prompt } => {
            commands::run_generate(&prompt, settings).await?;
        }

        Commands::Code { prompt } => {
            commands::run_code(&prompt, settings).await?;
        }

        Commands::Index { snippets } => {
            commands::run_index(snippets, settings).await?;
        }

        Commands::Search {
            query,
            limit,
            min_score,
        } => {
            commands::run_search(&query, limit, min_score, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(&host, port, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings).await?;
        }

        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, config_path, settings)?;
        }
    }

    Ok(())
}
