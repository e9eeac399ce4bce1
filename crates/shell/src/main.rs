mod commands;
mod metrics;
mod render;
mod session;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelscout_core::{
    load_config, validate_config, CatalogManager, MovieCatalog, Preferences, SanitizedConfig,
    SqliteStore, TmdbClient,
};

use session::{Flow, Session};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

const PROMPT: &str = "reelscout> ";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging; stdout belongs to the shell output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("reelscout {}", VERSION);

    // Determine config path
    let config_path = std::env::var("REELSCOUT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!(
        "Effective config: {}",
        serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default()
    );

    // Open the preference store
    let store = Arc::new(
        SqliteStore::new(&config.storage.path).with_context(|| {
            format!("Failed to open preference store at {:?}", config.storage.path)
        })?,
    );
    info!("Preference store initialized at {:?}", config.storage.path);

    // Create the catalog client
    let image_base_url = config.catalog.image_base_url().to_string();
    let catalog: Arc<dyn MovieCatalog> = Arc::new(
        TmdbClient::new(config.catalog.clone()).context("Failed to create TMDB client")?,
    );
    info!("TMDB client initialized");

    let manager = Arc::new(CatalogManager::new(catalog, Preferences::new(store)));
    let session = Session::new(manager, image_base_url);

    println!("{}", session.start().await);
    println!("Type 'help' for a list of commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}", PROMPT);
        std::io::stdout().flush().context("Failed to write to stdout")?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read input")?,
            _ = shutdown_signal() => None,
        };

        // End of input or Ctrl+C
        let Some(line) = line else {
            println!();
            break;
        };

        match commands::parse(&line) {
            Ok(None) => continue,
            Ok(Some(command)) => match session.handle(command).await {
                Flow::Continue(output) => print!("{}", output),
                Flow::Quit => break,
            },
            Err(e) => println!("{}", e),
        }
    }

    info!("Shutting down");
    Ok(())
}

/// Wait for Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}
