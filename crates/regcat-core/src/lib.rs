pub mod app_config;
pub mod config;
pub mod products;
pub mod taxonomy;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, StorageConfig, WritePolicy};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{ListingStub, ProductDetail, ProductRecord, ProductSeed, SeedsFile};
pub use taxonomy::{load_seeds, load_taxonomy, Category, Taxonomy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    FileParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),
}
