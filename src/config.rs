//! Configuration module for rssagg.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::rss::{DEFAULT_REQUEST_TIMEOUT_SECS, MAX_FEED_SIZE};
use crate::{AppError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string, e.g. `sqlite://data/rssagg.db`.
    #[serde(default = "default_db_url")]
    pub url: String,
}

fn default_db_url() -> String {
    "sqlite://data/rssagg.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_db_url(),
        }
    }
}

/// Background scraper configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Whether the scraper runs at all.
    #[serde(default = "default_scraper_enabled")]
    pub enabled: bool,
    /// Maximum number of feeds fetched per cycle (and in flight at once).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Seconds between scrape cycles.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Total timeout for a single feed request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Maximum accepted feed body size.
    #[serde(default = "default_max_feed_size")]
    pub max_feed_size_bytes: u64,
    /// User agent sent with feed requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_scraper_enabled() -> bool {
    true
}

fn default_concurrency() -> usize {
    10
}

fn default_interval() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_max_feed_size() -> u64 {
    MAX_FEED_SIZE
}

fn default_user_agent() -> String {
    "rssagg/0.1 (feed aggregator)".to_string()
}

impl ScraperConfig {
    /// Interval between cycles as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            enabled: default_scraper_enabled(),
            concurrency: default_concurrency(),
            interval_secs: default_interval(),
            request_timeout_secs: default_request_timeout(),
            max_feed_size_bytes: default_max_feed_size(),
            user_agent: default_user_agent(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path. Empty disables file logging.
    #[serde(default)]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: String::new(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Scraper configuration.
    #[serde(default)]
    pub scraper: ScraperConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load configuration for the running process.
    ///
    /// Reads `.env` if present, then the TOML file (defaults when the file
    /// does not exist), then applies environment overrides and validates.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = match Self::load(&path) {
            Ok(config) => config,
            Err(AppError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| AppError::Config(format!("config parse error: {}", e)))
    }

    /// Apply overrides from environment variables.
    ///
    /// Empty values are ignored. A value that does not parse is an error.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(env_value)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = parse_override(&lookup, "PORT", "a port number")? {
            self.server.port = port;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(n) = parse_override(&lookup, "SCRAPER_CONCURRENCY", "a positive integer")? {
            self.scraper.concurrency = n;
        }
        if let Some(secs) =
            parse_override(&lookup, "SCRAPER_INTERVAL_SECS", "a positive number of seconds")?
        {
            self.scraper.interval_secs = secs;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(AppError::Config("database.url must not be empty".into()));
        }
        if self.scraper.concurrency == 0 {
            return Err(AppError::Config(
                "scraper.concurrency must be at least 1".into(),
            ));
        }
        if self.scraper.interval_secs == 0 {
            return Err(AppError::Config(
                "scraper.interval_secs must be at least 1".into(),
            ));
        }
        if self.scraper.request_timeout_secs == 0 {
            return Err(AppError::Config(
                "scraper.request_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_override<F, T>(lookup: &F, key: &str, expected: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|e| {
            AppError::Config(format!("{} must be {}: {:?} ({})", key, expected, raw, e))
        }),
    }
}
