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

/// How the Postgres sink treats a record whose `(name, category)` already
/// exists in `products`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicy {
    /// Plain `INSERT`; a duplicate surfaces as a unique-violation error.
    Insert,
    /// `INSERT ... ON CONFLICT (name, category) DO UPDATE`.
    #[default]
    Upsert,
}

impl std::fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WritePolicy::Insert => write!(f, "insert"),
            WritePolicy::Upsert => write!(f, "upsert"),
        }
    }
}

/// Object-storage settings for image relocation. Absent from [`AppConfig`]
/// when `SUPABASE_URL` is not set, which disables relocation.
#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`.
    pub url: String,
    pub service_key: String,
    pub bucket: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("url", &self.url)
            .field("service_key", &"[redacted]")
            .field("bucket", &self.bucket)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Required only when records are written to Postgres.
    pub database_url: Option<String>,
    pub env: Environment,
    pub log_level: String,
    pub taxonomy_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub catalog_base_url: String,
    pub catalog_search_path: String,
    pub listing_limit: usize,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    /// Minimum gap between consecutive upstream requests.
    pub request_delay_ms: u64,
    /// Pause between two search terms.
    pub term_delay_ms: u64,
    pub write_policy: WritePolicy,
    pub storage: Option<StorageConfig>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("taxonomy_path", &self.taxonomy_path)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("catalog_base_url", &self.catalog_base_url)
            .field("catalog_search_path", &self.catalog_search_path)
            .field("listing_limit", &self.listing_limit)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("request_delay_ms", &self.request_delay_ms)
            .field("term_delay_ms", &self.term_delay_ms)
            .field("write_policy", &self.write_policy)
            .field("storage", &self.storage)
            .finish()
    }
}
