//! Normalization from scraped stubs and hand-curated seeds to
//! [`regcat_core::ProductRecord`].
//!
//! Price parsing is delegated to [`crate::parse::clean_price`]; this module
//! only assembles records. Nothing here performs I/O.

use regcat_core::{ListingStub, ProductRecord, ProductSeed};
use rust_decimal::Decimal;

use crate::parse::{bounded_price, clean_price};

/// Builds the record for one listing stub.
///
/// `item_type` is the search term that surfaced the stub. `suggested_amount`
/// is `suggested_override` when given, otherwise the parsed price. The
/// stub's detail link is carried as `source_url` (`""` when absent).
#[must_use]
pub fn normalize_record(
    category: &str,
    item_type: &str,
    stub: &ListingStub,
    description: String,
    image_url: String,
    suggested_override: Option<Decimal>,
) -> ProductRecord {
    let price = stub.raw_price.as_deref().and_then(clean_price);

    ProductRecord {
        name: stub.name.clone(),
        category: category.to_owned(),
        description,
        price,
        image_url,
        suggested_amount: suggested_override.and_then(bounded_price).or(price),
        item_type: item_type.to_owned(),
        source_url: stub.detail_link.clone().unwrap_or_default(),
    }
}

/// Builds the record for a seed. A seed amount that is negative or too
/// large for the price column becomes `None`; others are rounded to cents.
#[must_use]
pub fn normalize_seed(seed: &ProductSeed, image_url: String) -> ProductRecord {
    let price = bounded_price(seed.price);
    let suggested_amount = seed.suggested_amount.and_then(bounded_price).or(price);

    ProductRecord {
        name: seed.name.clone(),
        category: seed.category.clone(),
        description: seed.description.trim().to_owned(),
        price,
        image_url,
        suggested_amount,
        item_type: String::new(),
        source_url: String::new(),
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
