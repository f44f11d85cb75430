//! HTML extraction for catalog search pages, detail pages, and price text.
//!
//! All lookups are best-effort: a selector that matches nothing degrades the
//! affected field to `None` / `""` and never discards the surrounding row.

use std::str::FromStr;

use regcat_core::{ListingStub, ProductDetail};
use rust_decimal::{Decimal, RoundingStrategy};
use scraper::{ElementRef, Html, Selector};

use crate::error::ScraperError;

/// CSS selectors for one catalog site. The defaults target the storefront
/// the registry was originally seeded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSelectors {
    /// One node per search result.
    pub result: String,
    pub name: String,
    pub price: String,
    /// Anchor whose `href` is the detail-page link.
    pub link: String,
    /// `<img>` whose `data-src` (or `src`) is the thumbnail.
    pub thumbnail: String,
    /// Long-form description on the detail page.
    pub description: String,
    pub detail_name: String,
    pub detail_price: String,
    pub detail_image: String,
}

impl Default for CatalogSelectors {
    fn default() -> Self {
        Self {
            result: ".prd".to_string(),
            name: ".name".to_string(),
            price: ".prc".to_string(),
            link: "a.core".to_string(),
            thumbnail: "img.img".to_string(),
            description: ".-pdesc .markup".to_string(),
            detail_name: "h1.-fs20.-pts.-pbxs".to_string(),
            detail_price: "span.-b.-ubpt.-tal.-fs24.-prxs".to_string(),
            detail_image: "img.-fw.-fh".to_string(),
        }
    }
}

/// [`CatalogSelectors`] parsed once at client construction.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    result: Selector,
    name: Selector,
    price: Selector,
    link: Selector,
    thumbnail: Selector,
    description: Selector,
    detail_name: Selector,
    detail_price: Selector,
    detail_image: Selector,
}

impl CompiledSelectors {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSelector`] for the first selector that
    /// does not parse.
    pub fn compile(selectors: &CatalogSelectors) -> Result<Self, ScraperError> {
        Ok(Self {
            result: compile_one(&selectors.result)?,
            name: compile_one(&selectors.name)?,
            price: compile_one(&selectors.price)?,
            link: compile_one(&selectors.link)?,
            thumbnail: compile_one(&selectors.thumbnail)?,
            description: compile_one(&selectors.description)?,
            detail_name: compile_one(&selectors.detail_name)?,
            detail_price: compile_one(&selectors.detail_price)?,
            detail_image: compile_one(&selectors.detail_image)?,
        })
    }
}

fn compile_one(raw: &str) -> Result<Selector, ScraperError> {
    Selector::parse(raw).map_err(|e| ScraperError::InvalidSelector {
        selector: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Converts rendered price text into a non-negative decimal.
///
/// Keeps ASCII digits plus the first `.` that follows a digit; currency
/// symbols, thousands separators, and signs are dropped. A dash after the
/// first digit ends the scan so a range like `"₦5,000 - ₦7,000"` yields its
/// lower bound.
///
/// The result goes through [`bounded_price`]. Returns `None` when nothing
/// numeric remains or the amount does not fit the price column.
#[must_use]
pub fn clean_price(raw: &str) -> Option<Decimal> {
    let mut kept = String::with_capacity(raw.len());
    let mut seen_dot = false;

    for c in raw.chars() {
        if c.is_ascii_digit() {
            kept.push(c);
        } else if c == '.' && !seen_dot && kept.ends_with(|p: char| p.is_ascii_digit()) {
            kept.push(c);
            seen_dot = true;
        } else if matches!(c, '-' | '–') && !kept.is_empty() {
            break;
        }
    }

    let kept = kept.trim_end_matches('.');
    if kept.is_empty() {
        return None;
    }
    Decimal::from_str(kept).ok().and_then(bounded_price)
}

/// Largest amount the `NUMERIC(12, 2)` price columns hold: 9,999,999,999.99.
pub const MAX_PRICE: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// Rounds `amount` to cents (half away from zero, as Postgres does) and
/// rejects anything negative or above [`MAX_PRICE`].
#[must_use]
pub fn bounded_price(amount: Decimal) -> Option<Decimal> {
    let amount = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if amount.is_sign_negative() || amount > MAX_PRICE {
        tracing::debug!(%amount, "price outside storable range; dropping");
        return None;
    }
    Some(amount)
}

/// Extracts up to `limit` stubs from a search-results page, in document order.
#[must_use]
pub fn parse_listing_page(html: &str, limit: usize, selectors: &CompiledSelectors) -> Vec<ListingStub> {
    let document = Html::parse_document(html);

    document
        .select(&selectors.result)
        .take(limit)
        .map(|item| ListingStub {
            name: select_text(item, &selectors.name).unwrap_or_default(),
            raw_price: select_text(item, &selectors.price),
            detail_link: item
                .select(&selectors.link)
                .next()
                .and_then(|a| non_empty_attr(a, "href")),
            thumbnail_url: item
                .select(&selectors.thumbnail)
                .next()
                .and_then(image_source),
        })
        .collect()
}

/// Returns the trimmed description text from a detail page, or `""`.
#[must_use]
pub fn parse_description(html: &str, selectors: &CompiledSelectors) -> String {
    let document = Html::parse_document(html);
    document
        .select(&selectors.description)
        .next()
        .map(collapse_text)
        .unwrap_or_default()
}

/// Extracts the headline fields of a single product page.
#[must_use]
pub fn parse_product_page(
    html: &str,
    selectors: &CompiledSelectors,
    source_url: &str,
) -> ProductDetail {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let raw_price = select_text(root, &selectors.detail_price);
    let price = raw_price.as_deref().and_then(clean_price);

    ProductDetail {
        name: select_text(root, &selectors.detail_name).unwrap_or_default(),
        raw_price,
        price,
        description: select_text(root, &selectors.description).unwrap_or_default(),
        image_url: root
            .select(&selectors.detail_image)
            .next()
            .and_then(image_source)
            .unwrap_or_default(),
        source_url: source_url.to_string(),
    }
}

fn select_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope
        .select(selector)
        .next()
        .map(collapse_text)
        .filter(|t| !t.is_empty())
}

fn collapse_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty_attr(el: ElementRef<'_>, attr: &str) -> Option<String> {
    el.value()
        .attr(attr)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Lazy-loaded images keep the real URL in `data-src`; `src` is only used
/// when it is not an inline placeholder.
fn image_source(img: ElementRef<'_>) -> Option<String> {
    non_empty_attr(img, "data-src").or_else(|| {
        non_empty_attr(img, "src").filter(|src| !src.starts_with("data:"))
    })
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
