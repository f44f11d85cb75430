//! Record sinks used by `scrape` and `seed`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use regcat_core::{AppConfig, ProductRecord, WritePolicy};
use regcat_scraper::{ProductSink, SinkError};
use sqlx::PgPool;

/// Column order of the CSV output.
pub(crate) const CSV_HEADER: [&str; 7] = [
    "name",
    "price",
    "description",
    "category",
    "item_type",
    "image_url",
    "source_url",
];

/// Writes each record to the `products` table under the configured policy.
pub(crate) struct PgSink {
    pool: PgPool,
    policy: WritePolicy,
}

impl PgSink {
    /// Connects and pings so an unreachable database fails before any
    /// scraping starts.
    pub(crate) async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = regcat_db::connect_pool_from_config(config).await?;
        regcat_db::ping(&pool).await?;
        Ok(Self {
            pool,
            policy: config.write_policy,
        })
    }
}

impl ProductSink for PgSink {
    async fn insert(&mut self, record: &ProductRecord) -> Result<(), SinkError> {
        regcat_db::write_product(&self.pool, record, self.policy)
            .await
            .map(|_| ())
            .map_err(SinkError::backend)
    }
}

/// Appends records to a CSV stream, flushing after every row.
pub(crate) struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<File> {
    pub(crate) fn create(path: &Path) -> Result<Self, SinkError> {
        Self::from_writer(File::create(path)?)
    }
}

impl<W: Write> CsvSink<W> {
    /// Wraps `inner` and writes the header row.
    pub(crate) fn from_writer(inner: W) -> Result<Self, SinkError> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(CSV_HEADER).map_err(SinkError::backend)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub(crate) fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }
}

impl<W: Write> ProductSink for CsvSink<W> {
    async fn insert(&mut self, record: &ProductRecord) -> Result<(), SinkError> {
        let price = record.price.map(|p| p.to_string()).unwrap_or_default();
        self.writer
            .write_record([
                record.name.as_str(),
                price.as_str(),
                record.description.as_str(),
                record.category.as_str(),
                record.item_type.as_str(),
                record.image_url.as_str(),
                record.source_url.as_str(),
            ])
            .map_err(SinkError::backend)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Prints records as JSON lines instead of persisting them.
pub(crate) struct DryRunSink<W: Write> {
    out: W,
}

impl<W: Write> DryRunSink<W> {
    pub(crate) fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> ProductSink for DryRunSink<W> {
    async fn insert(&mut self, record: &ProductRecord) -> Result<(), SinkError> {
        let line = serde_json::to_string(record).map_err(SinkError::backend)?;
        writeln!(self.out, "{line}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn record(price: Option<Decimal>) -> ProductRecord {
        ProductRecord {
            name: "ACME Blender".to_string(),
            category: "Kitchen & Dining".to_string(),
            description: "Powerful, 1.5L".to_string(),
            price,
            image_url: String::new(),
            suggested_amount: price,
            item_type: "Blender".to_string(),
            source_url: "https://shop.example.com/acme-blender.html".to_string(),
        }
    }

    #[tokio::test]
    async fn csv_sink_writes_header_then_rows_in_column_order() {
        let mut sink = CsvSink::from_writer(Vec::new()).unwrap();
        sink.insert(&record(Some(Decimal::new(27_280, 0))))
            .await
            .unwrap();

        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let mut lines = out.lines();
        assert_eq!(
            lines.next(),
            Some("name,price,description,category,item_type,image_url,source_url")
        );
        assert_eq!(
            lines.next(),
            Some(
                "ACME Blender,27280,\"Powerful, 1.5L\",Kitchen & Dining,Blender,,https://shop.example.com/acme-blender.html"
            )
        );
        assert_eq!(lines.next(), None);
    }

    #[tokio::test]
    async fn csv_sink_leaves_missing_price_empty() {
        let mut sink = CsvSink::from_writer(Vec::new()).unwrap();
        sink.insert(&record(None)).await.unwrap();

        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let row = out.lines().nth(1).unwrap();
        assert!(row.starts_with("ACME Blender,,"), "row: {row}");
    }

    #[tokio::test]
    async fn csv_sink_header_only_when_nothing_written() {
        let sink = CsvSink::from_writer(Vec::new()).unwrap();
        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(out.lines().count(), 1);
    }

    #[tokio::test]
    async fn dry_run_sink_prints_one_json_line_per_record() {
        let mut buf = Vec::new();
        {
            let mut sink = DryRunSink::new(&mut buf);
            sink.insert(&record(Some(Decimal::new(5, 0)))).await.unwrap();
            sink.insert(&record(None)).await.unwrap();
        }
        let out = String::from_utf8(buf).unwrap();
        assert_eq!(out.lines().count(), 2);
        let first: serde_json::Value = serde_json::from_str(out.lines().next().unwrap()).unwrap();
        assert_eq!(first["name"], "ACME Blender");
        assert_eq!(first["price"], "5");
    }
}
