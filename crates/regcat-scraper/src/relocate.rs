//! Image relocation: download a product image from its original host and
//! re-upload it to the registry's storage bucket.
//!
//! Relocation never fails the caller. The outcome is a typed [`Relocation`]
//! so a missing image and a failed upload stay distinguishable, and
//! [`Relocation::into_image_url`] collapses both to `""` for the record.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use reqwest::Client;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::error::ScraperError;
use crate::pacing::Pacer;
use crate::storage::StorageClient;

/// Anything outside the storage-safe key alphabet `[A-Za-z0-9._-]`.
static KEY_UNSAFE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid key charset regex"));
static KEY_UNDERSCORES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{2,}").expect("valid underscore run regex"));

/// Hex characters of the content digest kept in an object key.
const KEY_HASH_LEN: usize = 12;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug)]
pub enum Relocation {
    Relocated { key: String, public_url: String },
    /// No source image, or relocation is not configured.
    Skipped,
    Failed(RelocationFailure),
}

impl Relocation {
    /// The URL to persist: the public URL on success, `""` otherwise.
    #[must_use]
    pub fn into_image_url(self) -> String {
        match self {
            Relocation::Relocated { public_url, .. } => public_url,
            Relocation::Skipped | Relocation::Failed(_) => String::new(),
        }
    }

    #[must_use]
    pub fn is_relocated(&self) -> bool {
        matches!(self, Relocation::Relocated { .. })
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Relocation::Failed(_))
    }
}

#[derive(Debug, Error)]
pub enum RelocationFailure {
    #[error("image download returned HTTP {status}")]
    DownloadStatus { status: u16 },

    #[error("image download failed: {0}")]
    Download(#[source] ScraperError),

    #[error("image upload failed: {0}")]
    Upload(#[source] ScraperError),
}

pub struct ImageRelocator {
    client: Client,
    storage: Option<StorageClient>,
    pacer: Arc<Pacer>,
}

impl ImageRelocator {
    /// `storage = None` turns every relocation into [`Relocation::Skipped`].
    #[must_use]
    pub fn new(client: Client, storage: Option<StorageClient>, pacer: Arc<Pacer>) -> Self {
        Self {
            client,
            storage,
            pacer,
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.storage.is_some()
    }

    /// Downloads `source_url` and uploads it under a key derived from
    /// `product_name` and the image content.
    ///
    /// A blank or absent `source_url` returns [`Relocation::Skipped`] without
    /// any I/O.
    pub async fn relocate(&self, source_url: Option<&str>, product_name: &str) -> Relocation {
        let Some(source_url) = source_url.map(str::trim).filter(|u| !u.is_empty()) else {
            return Relocation::Skipped;
        };
        let Some(storage) = &self.storage else {
            tracing::debug!(product = product_name, "image relocation disabled; skipping");
            return Relocation::Skipped;
        };

        let (bytes, content_type) = match self.download(source_url).await {
            Ok(downloaded) => downloaded,
            Err(failure) => {
                tracing::warn!(
                    product = product_name,
                    source_url,
                    error = %failure,
                    "image relocation failed"
                );
                return Relocation::Failed(failure);
            }
        };

        let key = object_key(product_name, source_url, &bytes);
        if let Err(e) = storage.upload(&key, bytes, &content_type).await {
            let failure = RelocationFailure::Upload(e);
            tracing::warn!(
                product = product_name,
                source_url,
                key = %key,
                error = %failure,
                "image relocation failed"
            );
            return Relocation::Failed(failure);
        }

        let public_url = storage.public_url(&key);
        tracing::debug!(product = product_name, key = %key, "image relocated");
        Relocation::Relocated { key, public_url }
    }

    async fn download(&self, source_url: &str) -> Result<(Vec<u8>, String), RelocationFailure> {
        self.pacer.wait().await;

        let response = self
            .client
            .get(source_url)
            .send()
            .await
            .map_err(|e| RelocationFailure::Download(e.into()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelocationFailure::DownloadStatus {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_owned();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RelocationFailure::Download(e.into()))?;

        Ok((bytes.to_vec(), content_type))
    }
}

/// Builds the bucket key for an image.
///
/// The readable prefix is the product name with every run of characters
/// outside `[A-Za-z0-9._-]` replaced by a single `_`; the suffix is a
/// truncated SHA-256 of the image bytes plus the source URL's file extension.
/// Identical name and content always give the same key; same-named products
/// with different images do not collide.
#[must_use]
pub fn object_key(product_name: &str, source_url: &str, bytes: &[u8]) -> String {
    let replaced = KEY_UNSAFE_RE.replace_all(product_name.trim(), "_");
    let collapsed = KEY_UNDERSCORES_RE.replace_all(&replaced, "_");
    let readable = match collapsed.trim_matches('_') {
        "" => "product",
        r => r,
    };

    let digest = format!("{:x}", Sha256::digest(bytes));
    let ext = source_extension(source_url);

    format!("{readable}-{}{ext}", &digest[..KEY_HASH_LEN])
}

/// File extension of the last path segment of `url`, including the dot
/// (`".jpg"`), or `""`. Query strings and fragments are ignored.
fn source_extension(url: &str) -> String {
    let path = reqwest::Url::parse(url).map_or_else(
        |_| {
            url.split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_owned()
        },
        |u| u.path().to_owned(),
    );

    let segment = path.rsplit('/').next().unwrap_or_default();
    match segment.rfind('.') {
        Some(idx) if idx > 0 => {
            let ext = &segment[idx..];
            if ext.len() > 1 && ext[1..].chars().all(|c| c.is_ascii_alphanumeric()) {
                ext.to_owned()
            } else {
                String::new()
            }
        }
        _ => String::new(),
    }
}
