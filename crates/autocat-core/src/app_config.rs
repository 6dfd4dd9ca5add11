use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Absolute origin used when emitting canonical URLs, e.g. `https://shop.example`.
    pub site_base_url: Option<String>,
    /// Local YAML taxonomy; when set it replaces the upstream taxonomy endpoints.
    pub taxonomy_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub taxonomy_freshness_secs: u64,
    pub listing_freshness_secs: u64,
    pub cache_enabled: bool,
    /// Upper bound on cached upstream responses.
    pub cache_capacity: usize,
}

impl AppConfig {
    #[must_use]
    pub fn taxonomy_freshness(&self) -> Duration {
        Duration::from_secs(self.taxonomy_freshness_secs)
    }

    #[must_use]
    pub fn listing_freshness(&self) -> Duration {
        Duration::from_secs(self.listing_freshness_secs)
    }
}
