//! Catalog scraping, image relocation, and the record pipeline.

pub mod client;
pub mod error;
pub mod normalize;
pub mod pacing;
pub mod parse;
pub mod pipeline;
pub mod relocate;
pub mod storage;

pub use client::CatalogClient;
pub use error::ScraperError;
pub use normalize::{normalize_record, normalize_seed};
pub use pacing::Pacer;
pub use parse::{clean_price, CatalogSelectors};
pub use pipeline::{Pipeline, PipelineOptions, PipelineReport, ProductSink, SinkError};
pub use relocate::{object_key, ImageRelocator, Relocation, RelocationFailure};
pub use storage::StorageClient;
