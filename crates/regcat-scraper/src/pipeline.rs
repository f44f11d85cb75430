//! The pipeline driver: taxonomy terms in, sink writes out.
//!
//! Every stage runs strictly in sequence on the calling task:
//! fetch listing, enrich, relocate, normalize, sink, then the next stub.
//! Only sink failures are escalated; everything upstream degrades locally.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use regcat_core::{AppConfig, ProductRecord, ProductSeed, Taxonomy};
use reqwest::Client;
use thiserror::Error;

use crate::client::CatalogClient;
use crate::error::ScraperError;
use crate::normalize::{normalize_record, normalize_seed};
use crate::pacing::Pacer;
use crate::parse::CatalogSelectors;
use crate::relocate::{ImageRelocator, Relocation};
use crate::storage::StorageClient;

/// Failure reported by a [`ProductSink`] for a single record.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl SinkError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SinkError::Backend(Box::new(err))
    }
}

/// Destination for normalized records. Records are handed over one at a
/// time and are not retained by the pipeline afterwards.
pub trait ProductSink {
    fn insert(&mut self, record: &ProductRecord) -> impl Future<Output = Result<(), SinkError>>;
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Maximum stubs taken from each search page.
    pub limit: usize,
    /// Pause between consecutive terms. Not applied after the last term.
    pub term_delay: Duration,
    /// Stop at the first sink failure instead of counting and continuing.
    pub fail_fast: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            term_delay: Duration::from_millis(2000),
            fail_fast: false,
        }
    }
}

impl PipelineOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            limit: config.listing_limit,
            term_delay: Duration::from_millis(config.term_delay_ms),
            fail_fast: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub terms_processed: usize,
    pub stubs_seen: usize,
    pub records_written: usize,
    pub images_relocated: usize,
    pub image_failures: usize,
    pub sink_failures: usize,
}

impl PipelineReport {
    /// `true` when every record reached the sink.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.sink_failures == 0
    }

    fn record_relocation(&mut self, relocation: &Relocation) {
        match relocation {
            Relocation::Relocated { .. } => self.images_relocated += 1,
            Relocation::Failed(_) => self.image_failures += 1,
            Relocation::Skipped => {}
        }
    }
}

pub struct Pipeline {
    catalog: CatalogClient,
    relocator: ImageRelocator,
    options: PipelineOptions,
}

impl Pipeline {
    #[must_use]
    pub fn new(catalog: CatalogClient, relocator: ImageRelocator, options: PipelineOptions) -> Self {
        Self {
            catalog,
            relocator,
            options,
        }
    }

    /// Wires the catalog client, relocator, and a shared [`Pacer`] from
    /// application config. Relocation is disabled when no storage is
    /// configured.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError`] if the catalog client cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        let pacer = Arc::new(Pacer::from_millis(config.request_delay_ms));
        let catalog = CatalogClient::new(
            &config.catalog_base_url,
            &config.catalog_search_path,
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
            &CatalogSelectors::default(),
            Arc::clone(&pacer),
        )?;

        let http: Client = catalog.http().clone();
        let storage = config
            .storage
            .as_ref()
            .map(|s| StorageClient::new(http.clone(), s));
        if storage.is_none() {
            tracing::warn!("SUPABASE_URL not set; images will not be relocated");
        }
        let relocator = ImageRelocator::new(http, storage, pacer);

        Ok(Self::new(
            catalog,
            relocator,
            PipelineOptions::from_app_config(config),
        ))
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }

    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut PipelineOptions {
        &mut self.options
    }

    /// Runs every `(category, term)` of `taxonomy` through the pipeline.
    ///
    /// # Errors
    ///
    /// Only with `fail_fast` set: returns the first [`SinkError`]. Otherwise
    /// sink failures are counted in [`PipelineReport::sink_failures`].
    pub async fn run<S: ProductSink>(
        &self,
        taxonomy: &Taxonomy,
        sink: &mut S,
    ) -> Result<PipelineReport, SinkError> {
        let mut report = PipelineReport::default();
        let total_terms = taxonomy.term_count();

        for (idx, (category, term)) in taxonomy.terms().enumerate() {
            tracing::info!(category, term, "processing term");
            let stubs = self.catalog.fetch_listings(term, self.options.limit).await;
            report.terms_processed += 1;
            report.stubs_seen += stubs.len();

            for stub in &stubs {
                let description = self
                    .catalog
                    .fetch_description(stub.detail_link.as_deref())
                    .await;

                let relocation = if stub.has_thumbnail() {
                    self.relocator
                        .relocate(stub.thumbnail_url.as_deref(), &stub.name)
                        .await
                } else {
                    Relocation::Skipped
                };
                report.record_relocation(&relocation);

                let record = normalize_record(
                    category,
                    term,
                    stub,
                    description,
                    relocation.into_image_url(),
                    None,
                );
                self.write(sink, &record, &mut report).await?;
            }

            if idx + 1 < total_terms && !self.options.term_delay.is_zero() {
                tokio::time::sleep(self.options.term_delay).await;
            }
        }

        tracing::info!(
            terms = report.terms_processed,
            stubs = report.stubs_seen,
            written = report.records_written,
            images = report.images_relocated,
            image_failures = report.image_failures,
            sink_failures = report.sink_failures,
            "pipeline run complete"
        );
        Ok(report)
    }

    /// Relocates, normalizes, and sinks a fixed list of seeds. No catalog
    /// requests are made. With relocation disabled each record keeps the
    /// seed's own `image_url`.
    ///
    /// # Errors
    ///
    /// Same contract as [`Pipeline::run`].
    pub async fn run_seeds<S: ProductSink>(
        &self,
        seeds: &[ProductSeed],
        sink: &mut S,
    ) -> Result<PipelineReport, SinkError> {
        let mut report = PipelineReport::default();

        for seed in seeds {
            report.stubs_seen += 1;
            // Without storage the seed keeps the URL it was authored with.
            let image_url = if self.relocator.is_enabled() {
                let relocation = self
                    .relocator
                    .relocate(seed.image_url.as_deref(), &seed.name)
                    .await;
                report.record_relocation(&relocation);
                relocation.into_image_url()
            } else {
                seed.image_url
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or_default()
                    .to_string()
            };

            let record = normalize_seed(seed, image_url);
            self.write(sink, &record, &mut report).await?;
        }

        tracing::info!(
            seeds = report.stubs_seen,
            written = report.records_written,
            images = report.images_relocated,
            image_failures = report.image_failures,
            sink_failures = report.sink_failures,
            "seed run complete"
        );
        Ok(report)
    }

    async fn write<S: ProductSink>(
        &self,
        sink: &mut S,
        record: &ProductRecord,
        report: &mut PipelineReport,
    ) -> Result<(), SinkError> {
        match sink.insert(record).await {
            Ok(()) => {
                report.records_written += 1;
                Ok(())
            }
            Err(e) => {
                report.sink_failures += 1;
                tracing::error!(
                    product = %record.name,
                    category = %record.category,
                    error = %e,
                    "failed to write record"
                );
                if self.options.fail_fast {
                    Err(e)
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relocate::RelocationFailure;

    #[test]
    fn report_counts_relocation_outcomes() {
        let mut report = PipelineReport::default();
        report.record_relocation(&Relocation::Skipped);
        report.record_relocation(&Relocation::Relocated {
            key: "k".to_string(),
            public_url: "u".to_string(),
        });
        report.record_relocation(&Relocation::Failed(RelocationFailure::DownloadStatus {
            status: 500,
        }));
        assert_eq!(report.images_relocated, 1);
        assert_eq!(report.image_failures, 1);
    }

    #[test]
    fn report_clean_only_without_sink_failures() {
        let mut report = PipelineReport::default();
        assert!(report.is_clean());
        report.sink_failures = 1;
        assert!(!report.is_clean());
    }

    #[test]
    fn default_options() {
        let opts = PipelineOptions::default();
        assert_eq!(opts.limit, 5);
        assert_eq!(opts.term_delay, Duration::from_millis(2000));
        assert!(!opts.fail_fast);
    }
}
