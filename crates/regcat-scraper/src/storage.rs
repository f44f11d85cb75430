//! Supabase-compatible object storage client used for image relocation.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regcat_core::StorageConfig;
use reqwest::Client;

use crate::error::ScraperError;

/// Object keys are sent as a single path segment.
const KEY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Cap on how much of an error body is kept in [`ScraperError::Storage`].
const MAX_ERROR_BODY: usize = 300;

pub struct StorageClient {
    client: Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl StorageClient {
    /// Wraps an existing HTTP client so uploads share its connection pool.
    #[must_use]
    pub fn new(client: Client, config: &StorageConfig) -> Self {
        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_owned(),
            service_key: config.service_key.clone(),
            bucket: config.bucket.clone(),
        }
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Uploads `bytes` under `key`, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] on transport failure or
    /// [`ScraperError::Storage`] when the storage API rejects the upload.
    pub async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ScraperError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            self.bucket,
            encode_key(key)
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|&i| body.is_char_boundary(i))
                .unwrap_or(0);
            body.truncate(cut);
        }
        Err(ScraperError::Storage {
            key: key.to_owned(),
            status: status.as_u16(),
            body,
        })
    }

    /// Public URL of `key` in a public bucket. Pure string formatting; no
    /// request is made.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            encode_key(key)
        )
    }
}

fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_ESCAPE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> StorageClient {
        StorageClient::new(
            Client::new(),
            &StorageConfig {
                url: "https://project.supabase.co/".to_string(),
                service_key: "key".to_string(),
                bucket: "registry-images".to_string(),
            },
        )
    }

    #[test]
    fn public_url_format() {
        assert_eq!(
            storage().public_url("ACME_Blender-0123456789ab.jpg"),
            "https://project.supabase.co/storage/v1/object/public/registry-images/ACME_Blender-0123456789ab.jpg"
        );
    }

    #[test]
    fn public_url_escapes_key_characters() {
        assert_eq!(
            storage().public_url("TV_(H620B)+Stand.png"),
            "https://project.supabase.co/storage/v1/object/public/registry-images/TV_%28H620B%29%2BStand.png"
        );
    }
}
