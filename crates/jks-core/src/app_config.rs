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

/// Server-side configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Base URL that invoice links are built from, e.g. `https://shop.example.com`.
    pub public_base_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Hosting platform base URL for object storage. Uploads are refused when unset.
    pub storage_url: Option<String>,
    pub storage_key: Option<String>,
    pub storage_bucket: String,
    pub http_timeout_secs: u64,
    /// Six-field cron expression for the lapsed-offer sweep.
    pub offer_sweep_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("public_base_url", &self.public_base_url)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("storage_url", &self.storage_url)
            .field(
                "storage_key",
                &self.storage_key.as_ref().map(|_| "[redacted]"),
            )
            .field("storage_bucket", &self.storage_bucket)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("offer_sweep_cron", &self.offer_sweep_cron)
            .finish()
    }
}

/// Configuration for the storefront CLI, which only talks to the HTTP API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub http_timeout_secs: u64,
    pub log_level: String,
}
