use std::net::SocketAddr;
use std::path::PathBuf;

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

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub scoring_policy_path: PathBuf,
    /// Server-wide secret keyed into every password hash.
    pub password_pepper: String,
    pub session_ttl_hours: u64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub rate_limit_per_minute: usize,
    pub opendata_api_key: Option<String>,
    pub opendata_base_url: String,
    pub opendata_cctv_service: String,
    pub opendata_streetlight_service: String,
    pub opendata_page_size: u32,
    pub opendata_max_records: u32,
    pub opendata_request_timeout_secs: u64,
    pub opendata_max_retries: u32,
    pub opendata_retry_backoff_base_ms: u64,
    /// Age after which the cached CCTV and streetlight positions are refetched.
    pub opendata_cache_ttl_secs: u64,
}

impl AppConfig {
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.env == Environment::Development
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("scoring_policy_path", &self.scoring_policy_path)
            .field("database_url", &"[redacted]")
            .field("password_pepper", &"[redacted]")
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field(
                "opendata_api_key",
                &self.opendata_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("opendata_base_url", &self.opendata_base_url)
            .field("opendata_cctv_service", &self.opendata_cctv_service)
            .field(
                "opendata_streetlight_service",
                &self.opendata_streetlight_service,
            )
            .field("opendata_page_size", &self.opendata_page_size)
            .field("opendata_max_records", &self.opendata_max_records)
            .field(
                "opendata_request_timeout_secs",
                &self.opendata_request_timeout_secs,
            )
            .field("opendata_max_retries", &self.opendata_max_retries)
            .field(
                "opendata_retry_backoff_base_ms",
                &self.opendata_retry_backoff_base_ms,
            )
            .field("opendata_cache_ttl_secs", &self.opendata_cache_ttl_secs)
            .finish()
    }
}
