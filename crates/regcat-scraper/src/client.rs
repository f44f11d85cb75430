use std::sync::Arc;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regcat_core::{ListingStub, ProductDetail};
use reqwest::Client;

use crate::error::ScraperError;
use crate::pacing::Pacer;
use crate::parse::{
    parse_description, parse_listing_page, parse_product_page, CatalogSelectors,
    CompiledSelectors,
};

/// Characters left unescaped in a search term: RFC 3986 unreserved.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// HTTP client for a catalog storefront's search and product pages.
///
/// Listing and detail fetches never fail the caller: transport errors and
/// non-2xx statuses are logged and degrade to an empty result. Every
/// outbound request first waits on the shared [`Pacer`].
pub struct CatalogClient {
    client: Client,
    base_url: String,
    search_path: String,
    selectors: CompiledSelectors,
    pacer: Arc<Pacer>,
}

impl CatalogClient {
    /// Creates a `CatalogClient` with the configured timeout and `User-Agent`.
    ///
    /// `base_url` is the storefront origin (e.g. `https://shop.example.com`);
    /// `search_path` is appended to it, followed by the escaped term.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if `base_url` does not parse,
    /// [`ScraperError::InvalidSelector`] if a selector does not compile, or
    /// [`ScraperError::Http`] if the underlying `reqwest::Client` cannot be built.
    pub fn new(
        base_url: &str,
        search_path: &str,
        timeout_secs: u64,
        user_agent: &str,
        selectors: &CatalogSelectors,
        pacer: Arc<Pacer>,
    ) -> Result<Self, ScraperError> {
        reqwest::Url::parse(base_url).map_err(|e| ScraperError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            search_path: search_path.to_owned(),
            selectors: CompiledSelectors::compile(selectors)?,
            pacer,
        })
    }

    /// The underlying HTTP client, for collaborators that should share its
    /// connection pool and `User-Agent`.
    #[must_use]
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Fetches the search page for `term` and returns up to `limit` stubs,
    /// with detail links resolved to absolute URLs.
    ///
    /// Returns an empty `Vec` without any request when `term` is blank or
    /// `limit` is zero, and after logging when the fetch fails.
    pub async fn fetch_listings(&self, term: &str, limit: usize) -> Vec<ListingStub> {
        let term = term.trim();
        if term.is_empty() || limit == 0 {
            return Vec::new();
        }

        let url = self.search_url(term);
        match self.fetch_html(&url).await {
            Ok(html) => {
                let mut stubs = parse_listing_page(&html, limit, &self.selectors);
                for stub in &mut stubs {
                    stub.detail_link = stub.detail_link.take().and_then(|link| {
                        self.absolute_url(&link)
                            .inspect_err(|e| {
                                tracing::warn!(term, link = %link, error = %e, "dropping unusable detail link");
                            })
                            .ok()
                    });
                }
                tracing::debug!(term, count = stubs.len(), "parsed listing page");
                stubs
            }
            Err(e) => {
                tracing::warn!(term, url = %url, error = %e, "listing fetch failed; skipping term");
                Vec::new()
            }
        }
    }

    /// Fetches the detail page behind `detail_link` and returns its
    /// description text.
    ///
    /// Returns `""` without any request when the link is absent or blank,
    /// and after logging when the fetch fails.
    pub async fn fetch_description(&self, detail_link: Option<&str>) -> String {
        let Some(link) = detail_link.map(str::trim).filter(|l| !l.is_empty()) else {
            return String::new();
        };

        let url = match self.absolute_url(link) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(link, error = %e, "unusable detail link");
                return String::new();
            }
        };

        match self.fetch_html(&url).await {
            Ok(html) => parse_description(&html, &self.selectors),
            Err(e) => {
                tracing::warn!(link, url = %url, error = %e, "detail fetch failed; leaving description empty");
                String::new()
            }
        }
    }

    /// Fetches one product page and extracts its headline fields.
    ///
    /// # Errors
    ///
    /// Unlike the pipeline fetches this surfaces failures:
    /// [`ScraperError::InvalidUrl`], [`ScraperError::UnexpectedStatus`], or
    /// [`ScraperError::Http`].
    pub async fn fetch_product_detail(&self, url: &str) -> Result<ProductDetail, ScraperError> {
        let url = self.absolute_url(url)?;
        let html = self.fetch_html(&url).await?;
        Ok(parse_product_page(&html, &self.selectors, &url))
    }

    /// Resolves a possibly site-relative link against the storefront origin.
    /// Absolute links are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidUrl`] if the link cannot be joined.
    pub fn absolute_url(&self, link: &str) -> Result<String, ScraperError> {
        let base = reqwest::Url::parse(&self.base_url).map_err(|e| ScraperError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        base.join(link)
            .map(|u| u.to_string())
            .map_err(|e| ScraperError::InvalidUrl {
                url: link.to_owned(),
                reason: e.to_string(),
            })
    }

    fn search_url(&self, term: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url,
            self.search_path,
            utf8_percent_encode(term, QUERY_ESCAPE)
        )
    }

    async fn fetch_html(&self, url: &str) -> Result<String, ScraperError> {
        self.pacer.wait().await;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
