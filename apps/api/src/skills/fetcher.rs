//! Downloads CV files from the configured file host.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to fetch PDF from URL: {url}")]
    Status { url: String, status: u16 },

    #[error("Timed out after {timeout:?} fetching PDF from URL: {url}")]
    Timeout { url: String, timeout: Duration },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Resolves file references against a fixed base URL and downloads them.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Fetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into(),
            timeout,
        })
    }

    /// Plain concatenation; the reference is not sanitised.
    pub fn resolve(&self, file_ref: &str) -> String {
        format!("{}{}", self.base_url, file_ref)
    }

    /// GETs the referenced file. Anything but HTTP 200 is an error carrying the upstream status.
    pub async fn fetch(&self, file_ref: &str) -> Result<Bytes, FetchError> {
        let url = self.resolve(file_ref);
        info!("Fetching {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(e, &url))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e, &url))?;
        debug!("Fetched {} bytes from {url}", body.len());
        Ok(body)
    }

    fn classify(&self, err: reqwest::Error, url: &str) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            FetchError::Http(err)
        }
    }
}
