use std::net::SocketAddr;

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
    /// Base URL of the hosted table store, e.g. `https://xyz.supabase.co`.
    pub store_url: String,
    /// Public (anon) key sent as both `apikey` and bearer token.
    pub store_api_key: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub store_request_timeout_secs: u64,
    pub store_max_retries: u32,
    pub store_retry_backoff_base_ms: u64,
    pub report_rate_limit_per_minute: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("store_url", &self.store_url)
            .field("store_api_key", &"[redacted]")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "store_request_timeout_secs",
                &self.store_request_timeout_secs,
            )
            .field("store_max_retries", &self.store_max_retries)
            .field(
                "store_retry_backoff_base_ms",
                &self.store_retry_backoff_base_ms,
            )
            .field(
                "report_rate_limit_per_minute",
                &self.report_rate_limit_per_minute,
            )
            .finish()
    }
}
