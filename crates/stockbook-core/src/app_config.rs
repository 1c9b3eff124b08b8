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
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,

    /// Server-default Anthropic key; callers may override per request.
    pub anthropic_api_key: Option<String>,
    pub ai_model: String,
    pub ai_base_url: String,

    pub storage_url: String,
    pub storage_key: String,
    pub storage_bucket: String,

    pub upc_database_api_key: Option<String>,
    pub barcode_lookup_api_key: Option<String>,

    pub fetch_user_agent: String,
    pub fetch_timeout_secs: u64,
    pub headless_nav_timeout_secs: u64,
    pub headless_render_delay_ms: u64,
    /// Explicit Chrome/Chromium binary; discovered from common paths when unset.
    pub chrome_executable: Option<String>,

    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("ai_model", &self.ai_model)
            .field("ai_base_url", &self.ai_base_url)
            .field("storage_url", &self.storage_url)
            .field("storage_key", &"[redacted]")
            .field("storage_bucket", &self.storage_bucket)
            .field(
                "upc_database_api_key",
                &self.upc_database_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "barcode_lookup_api_key",
                &self.barcode_lookup_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("fetch_user_agent", &self.fetch_user_agent)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("headless_nav_timeout_secs", &self.headless_nav_timeout_secs)
            .field("headless_render_delay_ms", &self.headless_render_delay_ms)
            .field("chrome_executable", &self.chrome_executable)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
