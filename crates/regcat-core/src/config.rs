use crate::app_config::{AppConfig, Environment, StorageConfig, WritePolicy};
use crate::ConfigError;

const DEFAULT_USER_AGENT: &str = "regcat/0.1 (gift-registry catalog sync)";
const DEFAULT_CATALOG_BASE_URL: &str = "https://www.jumia.com.ng";
const DEFAULT_CATALOG_SEARCH_PATH: &str = "/catalog/?q=";
const DEFAULT_BUCKET: &str = "wedding-registry-product-images";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation are decoupled from the process environment so the
/// tests can drive it with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.is_empty()) };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let database_url = optional("DATABASE_URL");
    let env = parse_environment(&or_default("REGCAT_ENV", "development"))?;
    let log_level = or_default("REGCAT_LOG_LEVEL", "info");
    let taxonomy_path = PathBuf::from(or_default(
        "REGCAT_TAXONOMY_PATH",
        "./config/taxonomy.yaml",
    ));

    let db_max_connections = parse_u32("REGCAT_DB_MAX_CONNECTIONS", "2")?;
    let db_min_connections = parse_u32("REGCAT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("REGCAT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let catalog_base_url = or_default("REGCAT_CATALOG_BASE_URL", DEFAULT_CATALOG_BASE_URL)
        .trim_end_matches('/')
        .to_string();
    if !(catalog_base_url.starts_with("http://") || catalog_base_url.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "REGCAT_CATALOG_BASE_URL".to_string(),
            reason: format!("expected an http(s) URL, got '{catalog_base_url}'"),
        });
    }
    let catalog_search_path = or_default("REGCAT_CATALOG_SEARCH_PATH", DEFAULT_CATALOG_SEARCH_PATH);

    let listing_limit = parse_usize("REGCAT_LISTING_LIMIT", "5")?;
    let scraper_request_timeout_secs = parse_u64("REGCAT_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default("REGCAT_SCRAPER_USER_AGENT", DEFAULT_USER_AGENT);
    let request_delay_ms = parse_u64("REGCAT_REQUEST_DELAY_MS", "1000")?;
    let term_delay_ms = parse_u64("REGCAT_TERM_DELAY_MS", "2000")?;
    let write_policy = parse_write_policy(&or_default("REGCAT_WRITE_POLICY", "upsert"))?;

    let storage = match optional("SUPABASE_URL") {
        Some(url) => Some(StorageConfig {
            url: url.trim_end_matches('/').to_string(),
            service_key: require("SUPABASE_SERVICE_KEY")?,
            bucket: or_default("REGCAT_STORAGE_BUCKET", DEFAULT_BUCKET),
        }),
        None => None,
    };

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        taxonomy_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        catalog_base_url,
        catalog_search_path,
        listing_limit,
        scraper_request_timeout_secs,
        scraper_user_agent,
        request_delay_ms,
        term_delay_ms,
        write_policy,
        storage,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "REGCAT_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

fn parse_write_policy(s: &str) -> Result<WritePolicy, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "insert" => Ok(WritePolicy::Insert),
        "upsert" => Ok(WritePolicy::Upsert),
        other => Err(ConfigError::InvalidEnvVar {
            var: "REGCAT_WRITE_POLICY".to_string(),
            reason: format!("expected insert or upsert; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
