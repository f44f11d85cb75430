//! Handlers for `scrape`, `seed`, and `inspect`.
//!
//! Sink and taxonomy problems are checked before the first upstream request
//! so a misconfigured run exits without touching the catalog.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use regcat_core::{AppConfig, ProductSeed, Taxonomy};
use regcat_scraper::{
    CatalogClient, CatalogSelectors, Pacer, Pipeline, PipelineReport, ProductSink,
};

use crate::sink::{CsvSink, DryRunSink, PgSink};
use crate::SinkKind;

#[derive(Debug)]
pub(crate) struct ScrapeOptions {
    pub sink: SinkKind,
    pub output: PathBuf,
    pub taxonomy: Option<PathBuf>,
    pub limit: Option<usize>,
    pub category: Option<String>,
    pub fail_fast: bool,
    pub dry_run: bool,
}

/// Either the full taxonomy run or a fixed seed list.
enum Workload<'a> {
    Taxonomy(&'a Taxonomy),
    Seeds(&'a [ProductSeed]),
}

pub(crate) async fn run_scrape(config: &AppConfig, options: ScrapeOptions) -> anyhow::Result<()> {
    let path = options.taxonomy.as_deref().unwrap_or(&config.taxonomy_path);
    let taxonomy = regcat_core::load_taxonomy(path)
        .with_context(|| format!("failed to load taxonomy from {}", path.display()))?;
    let taxonomy = select_categories(taxonomy, options.category.as_deref())?;

    let mut pipeline = Pipeline::from_app_config(config)?;
    if let Some(limit) = options.limit {
        pipeline.options_mut().limit = limit;
    }
    pipeline.options_mut().fail_fast = options.fail_fast;

    tracing::info!(
        terms = taxonomy.term_count(),
        limit = pipeline.options().limit,
        sink = ?options.sink,
        dry_run = options.dry_run,
        "starting scrape"
    );

    let workload = Workload::Taxonomy(&taxonomy);
    let report = if options.dry_run {
        drive(&pipeline, &workload, &mut DryRunSink::new(std::io::stdout().lock())).await?
    } else {
        drive_to(&pipeline, &workload, config, options.sink, &options.output).await?
    };
    finish(&report)
}

pub(crate) async fn run_seed(
    config: &AppConfig,
    file: &Path,
    sink: SinkKind,
    output: &Path,
) -> anyhow::Result<()> {
    let seeds = regcat_core::load_seeds(file)
        .with_context(|| format!("failed to load seeds from {}", file.display()))?;
    if seeds.is_empty() {
        anyhow::bail!("seed file {} contains no products", file.display());
    }

    let pipeline = Pipeline::from_app_config(config)?;
    tracing::info!(seeds = seeds.len(), sink = ?sink, "starting seed run");

    let report = drive_to(&pipeline, &Workload::Seeds(&seeds), config, sink, output).await?;
    finish(&report)
}

pub(crate) async fn run_inspect(config: &AppConfig, url: &str) -> anyhow::Result<()> {
    let client = CatalogClient::new(
        &config.catalog_base_url,
        &config.catalog_search_path,
        config.scraper_request_timeout_secs,
        &config.scraper_user_agent,
        &CatalogSelectors::default(),
        Arc::new(Pacer::disabled()),
    )?;

    let detail = client
        .fetch_product_detail(url)
        .await
        .with_context(|| format!("failed to fetch product page {url}"))?;
    println!("{}", serde_json::to_string_pretty(&detail)?);
    Ok(())
}

/// Applies the `--category` filter and rejects a taxonomy with no terms.
fn select_categories(taxonomy: Taxonomy, category: Option<&str>) -> anyhow::Result<Taxonomy> {
    let taxonomy = match category {
        Some(name) => {
            let filtered = taxonomy.only_category(name);
            if filtered.categories.is_empty() {
                anyhow::bail!("category '{name}' is not in the taxonomy");
            }
            filtered
        }
        None => taxonomy,
    };

    if taxonomy.term_count() == 0 {
        anyhow::bail!("taxonomy yields no search terms; nothing to do");
    }
    Ok(taxonomy)
}

/// Opens the requested sink and drives the workload into it.
async fn drive_to(
    pipeline: &Pipeline,
    workload: &Workload<'_>,
    config: &AppConfig,
    sink: SinkKind,
    output: &Path,
) -> anyhow::Result<PipelineReport> {
    match sink {
        SinkKind::Db => {
            let mut sink = PgSink::connect(config)
                .await
                .context("failed to open database sink")?;
            drive(pipeline, workload, &mut sink).await
        }
        SinkKind::Csv => {
            let mut sink = CsvSink::create(output)
                .with_context(|| format!("failed to create {}", output.display()))?;
            let report = drive(pipeline, workload, &mut sink).await?;
            sink.into_inner()?;
            eprintln!("wrote {} records to {}", report.records_written, output.display());
            Ok(report)
        }
    }
}

async fn drive<S: ProductSink>(
    pipeline: &Pipeline,
    workload: &Workload<'_>,
    sink: &mut S,
) -> anyhow::Result<PipelineReport> {
    let report = match workload {
        Workload::Taxonomy(taxonomy) => pipeline.run(taxonomy, sink).await,
        Workload::Seeds(seeds) => pipeline.run_seeds(seeds, sink).await,
    }
    .context("run aborted on first failed write")?;
    Ok(report)
}

/// Prints the run summary to stderr so stdout stays machine-readable.
fn finish(report: &PipelineReport) -> anyhow::Result<()> {
    eprintln!(
        "terms: {}, listings: {}, written: {}, images relocated: {}, image failures: {}, write failures: {}",
        report.terms_processed,
        report.stubs_seen,
        report.records_written,
        report.images_relocated,
        report.image_failures,
        report.sink_failures,
    );
    if !report.is_clean() {
        anyhow::bail!("{} record(s) failed to write", report.sink_failures);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regcat_core::Category;

    fn taxonomy() -> Taxonomy {
        Taxonomy {
            categories: vec![
                Category {
                    name: "Kitchen & Dining".to_string(),
                    terms: vec!["Blender".to_string(), "Toaster".to_string()],
                },
                Category {
                    name: "Empty".to_string(),
                    terms: vec![],
                },
            ],
        }
    }

    #[test]
    fn select_categories_without_filter_keeps_everything() {
        let t = select_categories(taxonomy(), None).unwrap();
        assert_eq!(t.term_count(), 2);
    }

    #[test]
    fn select_categories_filters_case_insensitively() {
        let t = select_categories(taxonomy(), Some("kitchen & dining")).unwrap();
        assert_eq!(t.categories.len(), 1);
    }

    #[test]
    fn select_categories_rejects_unknown_category() {
        let err = select_categories(taxonomy(), Some("Garden")).unwrap_err();
        assert!(err.to_string().contains("Garden"));
    }

    #[test]
    fn select_categories_rejects_zero_terms() {
        let err = select_categories(taxonomy(), Some("Empty")).unwrap_err();
        assert!(err.to_string().contains("no search terms"));
    }

    #[test]
    fn finish_fails_on_sink_failures() {
        let clean = PipelineReport {
            records_written: 3,
            ..PipelineReport::default()
        };
        assert!(finish(&clean).is_ok());

        let dirty = PipelineReport {
            sink_failures: 1,
            ..clean
        };
        assert!(finish(&dirty).is_err());
    }
}
