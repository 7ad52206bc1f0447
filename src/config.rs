//! Ledger configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::Provider;

/// Top-level configuration.
///
/// Loaded once at startup via [`LedgerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Socket address to bind the HTTP server to.
    pub listen_addr: SocketAddr,

    /// SQLite connection string.
    pub database_url: String,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Root of the metadata package (names, pool windows, icons).
    pub metadata_dir: PathBuf,

    /// Preferred metadata language.
    pub language: String,

    /// Language consulted when a name is missing in `language`.
    pub fallback_language: String,

    /// Provider used for sessions that do not name one.
    pub remote_provider: Provider,

    /// Per-request timeout of the remote client.
    pub remote_timeout: Duration,

    /// Delay between two pages of the same pool.
    pub remote_page_delay: Duration,

    /// Upper bound of records fetched per pool.
    pub remote_max_records_per_pool: usize,

    /// Upper bound of records loaded to build banners.
    pub ledger_list_limit: u32,

    /// Run a background incremental sync for the first account at startup.
    pub auto_sync_on_start: bool,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3170)),
            database_url: "sqlite://data/database/ledger.db?mode=rwc".to_string(),
            database_max_connections: 5,
            metadata_dir: PathBuf::from("data/metadata"),
            language: "zh-cn".to_string(),
            fallback_language: "zh-cn".to_string(),
            remote_provider: Provider::Hypergryph,
            remote_timeout: Duration::from_secs(15),
            remote_page_delay: Duration::from_millis(100),
            remote_max_records_per_pool: 10_000,
            ledger_list_limit: 100_000,
            auto_sync_on_start: false,
            event_bus_capacity: 1024,
        }
    }
}

impl LedgerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to the [`Default`] values when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`], or if `REMOTE_PROVIDER` names an unknown provider.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let remote_provider = match std::env::var("REMOTE_PROVIDER") {
            Ok(raw) => Provider::parse(&raw).ok_or_else(|| format!("unknown provider: {raw}"))?,
            Err(_) => defaults.remote_provider,
        };

        Ok(Self {
            listen_addr,
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: parse_env(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            metadata_dir: std::env::var("METADATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.metadata_dir),
            language: std::env::var("LANGUAGE").unwrap_or(defaults.language),
            fallback_language: std::env::var("FALLBACK_LANGUAGE")
                .unwrap_or(defaults.fallback_language),
            remote_provider,
            remote_timeout: Duration::from_secs(parse_env("REMOTE_TIMEOUT_SECS", 15)),
            remote_page_delay: Duration::from_millis(parse_env("REMOTE_PAGE_DELAY_MS", 100)),
            remote_max_records_per_pool: parse_env(
                "REMOTE_MAX_RECORDS_PER_POOL",
                defaults.remote_max_records_per_pool,
            ),
            ledger_list_limit: parse_env("LEDGER_LIST_LIMIT", defaults.ledger_list_limit),
            auto_sync_on_start: parse_env_bool("AUTO_SYNC_ON_START", defaults.auto_sync_on_start),
            event_bus_capacity: parse_env("EVENT_BUS_CAPACITY", defaults.event_bus_capacity),
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    parse_bool(std::env::var(key).ok().as_deref(), default)
}

fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}
