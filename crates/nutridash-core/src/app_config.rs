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

/// Application configuration, read from `NUTRIDASH_*` environment variables.
///
/// `database_url` is optional: a session without it can still fetch and
/// render, it just cannot save or reload summaries.
#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub database_url: Option<String>,
    pub api_base_url: String,
    pub api_page_size: u32,
    /// Fixed inter-page delay; 6000 ms keeps the crawl under the documented
    /// 10 requests/minute search ceiling.
    pub api_inter_request_delay_ms: u64,
    pub api_request_timeout_secs: u64,
    pub api_user_agent: String,
    pub dump_path: PathBuf,
    pub snapshot_url: String,
    pub snapshot_batch_size: usize,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("api_base_url", &self.api_base_url)
            .field("api_page_size", &self.api_page_size)
            .field(
                "api_inter_request_delay_ms",
                &self.api_inter_request_delay_ms,
            )
            .field("api_request_timeout_secs", &self.api_request_timeout_secs)
            .field("api_user_agent", &self.api_user_agent)
            .field("dump_path", &self.dump_path)
            .field("snapshot_url", &self.snapshot_url)
            .field("snapshot_batch_size", &self.snapshot_batch_size)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
