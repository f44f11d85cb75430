use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Minimal product data lifted from one result row of a catalog search page,
/// before the detail page or the image have been touched.
///
/// Every field is best-effort: a selector miss leaves it `None` rather than
/// discarding the row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingStub {
    pub name: String,
    /// Price text exactly as rendered, e.g. `"₦58,900"`.
    pub raw_price: Option<String>,
    /// Detail-page link. Site-relative as parsed (`"/acme-blender.html"`);
    /// the catalog client resolves it to an absolute URL.
    pub detail_link: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl ListingStub {
    /// Returns `true` when the row carries an image worth relocating.
    #[must_use]
    pub fn has_thumbnail(&self) -> bool {
        self.thumbnail_url.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// A normalized product, ready for a sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub category: String,
    pub description: String,
    /// Non-negative when present.
    pub price: Option<Decimal>,
    /// Public URL of the relocated image, or `""` when relocation was skipped
    /// or failed. Never absent.
    pub image_url: String,
    pub suggested_amount: Option<Decimal>,
    /// Search term that surfaced the product (`""` for seeded products).
    pub item_type: String,
    /// Absolute detail-page URL, or `""` when the listing had no link.
    pub source_url: String,
}

impl ProductRecord {
    /// Returns `true` if the record carries a relocated image.
    #[must_use]
    pub fn has_image(&self) -> bool {
        !self.image_url.is_empty()
    }
}

/// A hand-curated product entry loaded from a seeds file. Seeds skip the
/// catalog search and go straight to image relocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    pub category: String,
    /// Defaults to empty when omitted from the file.
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    /// Source image to relocate.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Overrides the default of `suggested_amount = price`.
    #[serde(default)]
    pub suggested_amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct SeedsFile {
    pub products: Vec<ProductSeed>,
}

/// Fields scraped from a single product page, as printed by `regcat inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDetail {
    pub name: String,
    pub raw_price: Option<String>,
    pub price: Option<Decimal>,
    pub description: String,
    pub image_url: String,
    pub source_url: String,
}
