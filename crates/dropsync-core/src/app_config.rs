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
    pub locales_path: PathBuf,

    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,

    pub shopify_shop_domain: Option<String>,
    pub shopify_admin_token: Option<String>,
    pub shopify_api_version: String,
    pub shopify_webhook_secret: Option<String>,

    pub aliexpress_app_key: Option<String>,
    pub aliexpress_app_secret: Option<String>,
    pub aliexpress_gateway_url: String,
    pub aliexpress_token_path: PathBuf,

    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub deepl_api_key: Option<String>,
    pub deepl_base_url: String,

    pub http_request_timeout_secs: u64,
    pub http_user_agent: String,
    pub http_max_retries: u32,
    pub http_retry_backoff_base_secs: u64,

    /// Sustained vendor request rate, in requests per second.
    pub vendor_requests_per_sec: f64,
    /// Maximum vendor request burst before pacing kicks in.
    pub vendor_burst: u32,
    /// Courtesy delay before advancing to the next ship-to candidate.
    pub fallback_unavailable_delay_ms: u64,
    /// Delay before the single same-country retry after a rate-limit error.
    pub fallback_rate_limit_delay_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("locales_path", &self.locales_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("shopify_shop_domain", &self.shopify_shop_domain)
            .field(
                "shopify_admin_token",
                &self.shopify_admin_token.as_ref().map(|_| "[redacted]"),
            )
            .field("shopify_api_version", &self.shopify_api_version)
            .field(
                "shopify_webhook_secret",
                &self.shopify_webhook_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("aliexpress_app_key", &self.aliexpress_app_key)
            .field(
                "aliexpress_app_secret",
                &self.aliexpress_app_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("aliexpress_gateway_url", &self.aliexpress_gateway_url)
            .field("aliexpress_token_path", &self.aliexpress_token_path)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field(
                "deepl_api_key",
                &self.deepl_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("deepl_base_url", &self.deepl_base_url)
            .field("http_request_timeout_secs", &self.http_request_timeout_secs)
            .field("http_user_agent", &self.http_user_agent)
            .field("http_max_retries", &self.http_max_retries)
            .field(
                "http_retry_backoff_base_secs",
                &self.http_retry_backoff_base_secs,
            )
            .field("vendor_requests_per_sec", &self.vendor_requests_per_sec)
            .field("vendor_burst", &self.vendor_burst)
            .field(
                "fallback_unavailable_delay_ms",
                &self.fallback_unavailable_delay_ms,
            )
            .field(
                "fallback_rate_limit_delay_ms",
                &self.fallback_rate_limit_delay_ms,
            )
            .finish()
    }
}
