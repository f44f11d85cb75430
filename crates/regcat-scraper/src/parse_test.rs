use super::*;

fn selectors() -> CompiledSelectors {
    CompiledSelectors::compile(&CatalogSelectors::default()).expect("default selectors compile")
}

const LISTING_HTML: &str = r#"
<html><body>
  <article class="prd">
    <a class="core" href="/acme-blender.html">
      <img class="img" data-src="https://img.example.com/blender.jpg" src="data:image/gif;base64,R0lGOD">
      <h3 class="name">ACME   Blender</h3>
      <div class="prc">₦27,280</div>
    </a>
  </article>
  <article class="prd">
    <a class="core" href="/kettle.html">
      <img class="img" src="https://img.example.com/kettle.png">
      <h3 class="name">Steel Kettle</h3>
    </a>
  </article>
  <article class="prd">
    <div class="name">Orphan Toaster</div>
    <div class="prc">Price on request</div>
  </article>
</body></html>
"#;

// -----------------------------------------------------------------------
// clean_price
// -----------------------------------------------------------------------

#[test]
fn clean_price_strips_currency_and_thousands_separators() {
    assert_eq!(clean_price("₦58,900"), Some(Decimal::new(58_900, 0)));
}

#[test]
fn clean_price_keeps_single_decimal_separator() {
    assert_eq!(clean_price("₦1,234.50"), Some(Decimal::new(123_450, 2)));
}

#[test]
fn clean_price_ignores_dot_before_digits() {
    assert_eq!(clean_price("Rs. 500"), Some(Decimal::new(500, 0)));
}

#[test]
fn clean_price_drops_second_dot() {
    assert_eq!(clean_price("1.2.3"), Some(Decimal::new(123, 2)));
}

#[test]
fn clean_price_trailing_dot_is_ignored() {
    assert_eq!(clean_price("500."), Some(Decimal::new(500, 0)));
}

#[test]
fn clean_price_range_takes_lower_bound() {
    assert_eq!(clean_price("₦5,000 - ₦7,000"), Some(Decimal::new(5000, 0)));
}

#[test]
fn clean_price_no_digits_is_none() {
    assert_eq!(clean_price("Price on request"), None);
    assert_eq!(clean_price(""), None);
    assert_eq!(clean_price("₦,."), None);
}

#[test]
fn clean_price_is_never_negative() {
    let price = clean_price("-₦300").expect("digits present");
    assert!(price >= Decimal::ZERO);
    assert_eq!(price, Decimal::new(300, 0));
}

#[test]
fn clean_price_rounds_to_cents() {
    assert_eq!(clean_price("₦19.995"), Some(Decimal::new(2000, 2)));
    assert_eq!(clean_price("₦19.994"), Some(Decimal::new(1999, 2)));
}

#[test]
fn clean_price_accepts_column_maximum() {
    assert_eq!(clean_price("₦9,999,999,999.99"), Some(MAX_PRICE));
}

#[test]
fn clean_price_rejects_amount_wider_than_column() {
    assert_eq!(clean_price("₦10,000,000,000"), None);
    assert_eq!(clean_price("1234567890123456789012345678"), None);
    assert_eq!(clean_price("99999999999999999999999999999999999"), None);
}

#[test]
fn bounded_price_rejects_negative() {
    assert_eq!(bounded_price(Decimal::new(-1, 2)), None);
    assert_eq!(bounded_price(Decimal::ZERO), Some(Decimal::ZERO));
}

// -----------------------------------------------------------------------
// parse_listing_page
// -----------------------------------------------------------------------

#[test]
fn listing_extracts_all_fields() {
    let stubs = parse_listing_page(LISTING_HTML, 5, &selectors());
    assert_eq!(stubs.len(), 3);
    assert_eq!(stubs[0].name, "ACME Blender");
    assert_eq!(stubs[0].raw_price.as_deref(), Some("₦27,280"));
    assert_eq!(stubs[0].detail_link.as_deref(), Some("/acme-blender.html"));
    assert_eq!(
        stubs[0].thumbnail_url.as_deref(),
        Some("https://img.example.com/blender.jpg")
    );
}

#[test]
fn listing_falls_back_to_src_when_no_data_src() {
    let stubs = parse_listing_page(LISTING_HTML, 5, &selectors());
    assert_eq!(
        stubs[1].thumbnail_url.as_deref(),
        Some("https://img.example.com/kettle.png")
    );
    assert!(stubs[1].raw_price.is_none());
}

#[test]
fn listing_missing_fields_degrade_to_none() {
    let stubs = parse_listing_page(LISTING_HTML, 5, &selectors());
    let orphan = &stubs[2];
    assert_eq!(orphan.name, "Orphan Toaster");
    assert!(orphan.detail_link.is_none());
    assert!(orphan.thumbnail_url.is_none());
    assert_eq!(orphan.raw_price.as_deref(), Some("Price on request"));
}

#[test]
fn listing_respects_limit_in_document_order() {
    let stubs = parse_listing_page(LISTING_HTML, 2, &selectors());
    let names: Vec<_> = stubs.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["ACME Blender", "Steel Kettle"]);
}

#[test]
fn listing_without_results_is_empty() {
    let stubs = parse_listing_page("<html><body><p>No results</p></body></html>", 5, &selectors());
    assert!(stubs.is_empty());
}

#[test]
fn listing_ignores_inline_placeholder_src() {
    let html = r#"<div class="prd"><div class="name">Mug</div><img class="img" src="data:image/png;base64,AAAA"></div>"#;
    let stubs = parse_listing_page(html, 5, &selectors());
    assert_eq!(stubs.len(), 1);
    assert!(stubs[0].thumbnail_url.is_none());
}

// -----------------------------------------------------------------------
// parse_description / parse_product_page
// -----------------------------------------------------------------------

#[test]
fn description_is_trimmed_and_collapsed() {
    let html = r#"<div class="-pdesc"><div class="markup">
        <p>Powerful   motor.</p>
        <p>Two jars included.</p>
    </div></div>"#;
    assert_eq!(
        parse_description(html, &selectors()),
        "Powerful motor. Two jars included."
    );
}

#[test]
fn description_missing_node_is_empty() {
    assert_eq!(parse_description("<div class=\"markup\">x</div>", &selectors()), "");
}

#[test]
fn product_page_extracts_headline_fields() {
    let html = r#"
        <h1 class="-fs20 -pts -pbxs">Better Homes 16-Piece Dinner Set</h1>
        <span class="-b -ubpt -tal -fs24 -prxs">₦40,000</span>
        <img class="-fw -fh" data-src="https://img.example.com/dinner.jpg">
        <div class="-pdesc"><div class="markup">Stoneware.</div></div>
    "#;
    let detail = parse_product_page(html, &selectors(), "https://shop.example.com/dinner.html");
    assert_eq!(detail.name, "Better Homes 16-Piece Dinner Set");
    assert_eq!(detail.raw_price.as_deref(), Some("₦40,000"));
    assert_eq!(detail.price, Some(Decimal::new(40_000, 0)));
    assert_eq!(detail.description, "Stoneware.");
    assert_eq!(detail.image_url, "https://img.example.com/dinner.jpg");
    assert_eq!(detail.source_url, "https://shop.example.com/dinner.html");
}

#[test]
fn product_page_missing_everything_is_blank() {
    let detail = parse_product_page("<html></html>", &selectors(), "https://x.test/p");
    assert_eq!(detail.name, "");
    assert!(detail.price.is_none());
    assert_eq!(detail.image_url, "");
}

#[test]
fn invalid_selector_is_reported() {
    let bad = CatalogSelectors {
        result: "div[".to_string(),
        ..CatalogSelectors::default()
    };
    let err = CompiledSelectors::compile(&bad).unwrap_err();
    assert!(matches!(err, ScraperError::InvalidSelector { ref selector, .. } if selector == "div["));
}
