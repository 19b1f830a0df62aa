use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use rssagg::rss::{spawn_scheduler, RssFetcher};
use rssagg::{Config, Database, Result, WebServer};

/// Environment variable naming the config file.
const CONFIG_PATH_ENV: &str = "RSSAGG_CONFIG";

/// Config file used when `RSSAGG_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let config = match Config::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", config_path, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = rssagg::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        rssagg::logging::init_console_only(&config.logging.level);
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<()> {
    info!("rssagg {}", env!("CARGO_PKG_VERSION"));

    let db = Database::open(&config.database.url).await?;

    let scheduler = if config.scraper.enabled {
        let fetcher = RssFetcher::new(&config.scraper)?;
        Some(spawn_scheduler(
            Arc::new(db.clone()),
            Arc::new(fetcher),
            config.scraper.concurrency,
            config.scraper.interval(),
        ))
    } else {
        info!("Scraper disabled");
        None
    };

    let server = WebServer::new(&config.server, db)?;
    server.run(shutdown_signal()).await?;

    if let Some(handle) = scheduler {
        handle.abort();
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
