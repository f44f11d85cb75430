//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use regcat_core::{ProductRecord, WritePolicy};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: Option<Decimal>,
    /// `""` when the image was not relocated.
    pub image_url: String,
    pub suggested_amount: Option<Decimal>,
    pub item_type: String,
    pub source_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inserts a product row.
///
/// Returns the internal `id` of the new row.
///
/// # Errors
///
/// Returns [`DbError::DuplicateProduct`] if `(name, category)` already
/// exists, or [`DbError::Sqlx`] for any other failure.
pub async fn insert_product(pool: &PgPool, record: &ProductRecord) -> Result<i64, DbError> {
    let result = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (name, category, description, price, image_url, suggested_amount, \
              item_type, source_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id",
    )
    .bind(&record.name)
    .bind(&record.category)
    .bind(&record.description)
    .bind(record.price)
    .bind(&record.image_url)
    .bind(record.suggested_amount)
    .bind(&record.item_type)
    .bind(&record.source_url)
    .fetch_one(pool)
    .await;

    match result {
        Ok(id) => Ok(id),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(DbError::DuplicateProduct {
                name: record.name.clone(),
                category: record.category.clone(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Upserts a product row.
///
/// Conflicts on `(name, category)` update `description`, `price`,
/// `image_url`, `suggested_amount`, `item_type`, `source_url`, and
/// `updated_at` in place.
///
/// Returns the internal `id` of the upserted row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_product(pool: &PgPool, record: &ProductRecord) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (name, category, description, price, image_url, suggested_amount, \
              item_type, source_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (name, category) DO UPDATE SET \
             description      = EXCLUDED.description, \
             price            = EXCLUDED.price, \
             image_url        = EXCLUDED.image_url, \
             suggested_amount = EXCLUDED.suggested_amount, \
             item_type        = EXCLUDED.item_type, \
             source_url       = EXCLUDED.source_url, \
             updated_at       = NOW() \
         RETURNING id",
    )
    .bind(&record.name)
    .bind(&record.category)
    .bind(&record.description)
    .bind(record.price)
    .bind(&record.image_url)
    .bind(record.suggested_amount)
    .bind(&record.item_type)
    .bind(&record.source_url)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Writes `record` according to `policy`.
///
/// # Errors
///
/// See [`insert_product`] and [`upsert_product`].
pub async fn write_product(
    pool: &PgPool,
    record: &ProductRecord,
    policy: WritePolicy,
) -> Result<i64, DbError> {
    match policy {
        WritePolicy::Insert => insert_product(pool, record).await,
        WritePolicy::Upsert => upsert_product(pool, record).await,
    }
}

/// Fetches the row for `(name, category)`, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(
    pool: &PgPool,
    name: &str,
    category: &str,
) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name, category, description, price, image_url, suggested_amount, \
                item_type, source_url, created_at, updated_at \
         FROM products \
         WHERE name = $1 AND category = $2",
    )
    .bind(name)
    .bind(category)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Counts all product rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_products(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
