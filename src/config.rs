use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default TTL for cached version and build lists in seconds (10 minutes)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

/// Timeout for a single upstream request in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// How long the vanilla version manifest is reused in seconds (5 minutes)
pub const MANIFEST_TTL_SECS: u64 = 300;

/// Timeout for establishing the Redis connection in milliseconds
pub const REDIS_CONNECT_TIMEOUT_MS: u64 = 5_000;

// =============================================================================
// Fan-out limits
// =============================================================================

/// Upper bound on concurrent per-version or per-build enrichment requests
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 16;

/// Number of most recent Jenkins builds inspected per listing
pub const MAX_JENKINS_BUILDS: usize = 50;

/// Minimum Java version returned when the rule file cannot be loaded
pub const FALLBACK_JAVA_VERSION: u32 = 17;

pub const DEFAULT_USER_AGENT: &str = concat!("jarvault/", env!("CARGO_PKG_VERSION"));

/// Process configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub cache: CacheConfig,
    pub providers: ProviderConfig,
    pub java_config_path: PathBuf,
}

/// Cache-related configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CacheConfig {
    /// Redis URL; the in-process cache is used when unset
    pub redis_url: Option<String>,
    #[serde(with = "duration_secs")]
    pub ttl: Duration,
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            connect_timeout: Duration::from_millis(REDIS_CONNECT_TIMEOUT_MS),
        }
    }
}

/// Settings shared by every upstream provider
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderConfig {
    pub user_agent: String,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    pub max_concurrent_fetches: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_millis(FETCH_TIMEOUT_MS),
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }
}

impl AppConfig {
    /// Build configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Recognized variables: `REDIS_URL`, `CACHE_TTL` (seconds),
    /// `JAVA_CONFIG_PATH`, `UPSTREAM_TIMEOUT_SECS`, `FETCH_CONCURRENCY`,
    /// `JARVAULT_USER_AGENT`. Unparsable numbers keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.cache.redis_url = get("REDIS_URL");
        if let Some(ttl) = get("CACHE_TTL").and_then(|v| parse_number::<u64>("CACHE_TTL", &v)) {
            config.cache.ttl = Duration::from_secs(ttl);
        }
        if let Some(path) = get("JAVA_CONFIG_PATH") {
            config.java_config_path = PathBuf::from(path);
        }
        if let Some(secs) = get("UPSTREAM_TIMEOUT_SECS")
            .and_then(|v| parse_number::<u64>("UPSTREAM_TIMEOUT_SECS", &v))
        {
            config.providers.timeout = Duration::from_secs(secs);
        }
        if let Some(width) = get("FETCH_CONCURRENCY")
            .and_then(|v| parse_number::<usize>("FETCH_CONCURRENCY", &v))
            .filter(|w| *w > 0)
        {
            config.providers.max_concurrent_fetches = width;
        }
        if let Some(agent) = get("JARVAULT_USER_AGENT") {
            config.providers.user_agent = agent;
        }

        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            providers: ProviderConfig::default(),
            java_config_path: PathBuf::from("java.json"),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        warn!("Ignoring invalid value for {}: {:?}", key, value);
    }
    parsed
}

mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Returns the path to the data directory for jarvault.
/// Uses $XDG_DATA_HOME/jarvault if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/jarvault,
/// or ./jarvault if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the directory log files are written to.
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("jarvault")
}
