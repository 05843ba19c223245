//! File transfer collaborator
//!
//! [`FileTransfer`] moves the bytes behind one URL into one file.
//! [`HttpTransfer`] is the reqwest implementation used by the CLI.

use crate::browser::{get_following_redirects, RedirectError};
use crate::GalleriaError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Per-request limits and headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOptions {
    /// Largest body accepted, in bytes
    pub max_bytes: u64,

    /// Redirect hops followed before giving up
    pub max_redirects: usize,

    /// Extra request headers (name, value)
    pub headers: Vec<(String, String)>,
}

/// Transfer failures
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("request timed out")]
    Timeout,

    #[error("response exceeds {limit} bytes")]
    OversizedResponse { limit: u64 },

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("stream error: {0}")]
    StreamError(String),
}

impl TransferError {
    /// Converts into the crate error, attaching the URL being fetched
    pub fn for_url(self, url: &str) -> GalleriaError {
        let url = url.to_string();
        match self {
            Self::InvalidUrl(reason) => GalleriaError::Validation { url, reason },
            Self::OversizedResponse { limit } => GalleriaError::Oversize { url, limit },
            other => GalleriaError::TransientFetch {
                url,
                message: other.to_string(),
            },
        }
    }
}

impl From<RedirectError> for TransferError {
    fn from(error: RedirectError) -> Self {
        match error {
            RedirectError::Request(e) if e.is_timeout() => Self::Timeout,
            RedirectError::Request(e) => Self::StreamError(e.to_string()),
            other => Self::StreamError(other.to_string()),
        }
    }
}

/// Fetches one URL into one file
#[async_trait]
pub trait FileTransfer: Send + Sync {
    /// Streams the body at `url` into `dest`
    ///
    /// # Returns
    ///
    /// The number of bytes written
    async fn fetch_to_file(
        &self,
        url: &str,
        dest: &Path,
        options: &TransferOptions,
    ) -> Result<u64, TransferError>;
}

/// FileTransfer over reqwest with streamed chunks
#[derive(Debug, Clone)]
pub struct HttpTransfer {
    client: Client,
}

impl HttpTransfer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn stream_to_file(
        &self,
        url: &str,
        dest: &Path,
        options: &TransferOptions,
    ) -> Result<u64, TransferError> {
        url::Url::parse(url).map_err(|e| TransferError::InvalidUrl(e.to_string()))?;

        let headers = build_headers(&options.headers);
        let mut response =
            get_following_redirects(&self.client, url, &headers, options.max_redirects).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Status(status.as_u16()));
        }

        // Declared size is checked before anything touches the disk
        if let Some(length) = response.content_length() {
            if length > options.max_bytes {
                return Err(TransferError::OversizedResponse {
                    limit: options.max_bytes,
                });
            }
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TransferError::StreamError(e.to_string()))?;
        }
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| TransferError::StreamError(e.to_string()))?;

        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            if e.is_timeout() {
                TransferError::Timeout
            } else {
                TransferError::StreamError(e.to_string())
            }
        })? {
            written += chunk.len() as u64;
            if written > options.max_bytes {
                return Err(TransferError::OversizedResponse {
                    limit: options.max_bytes,
                });
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| TransferError::StreamError(e.to_string()))?;
        }

        file.flush()
            .await
            .map_err(|e| TransferError::StreamError(e.to_string()))?;

        Ok(written)
    }
}

#[async_trait]
impl FileTransfer for HttpTransfer {
    async fn fetch_to_file(
        &self,
        url: &str,
        dest: &Path,
        options: &TransferOptions,
    ) -> Result<u64, TransferError> {
        let result = self.stream_to_file(url, dest, options).await;

        if result.is_err() && tokio::fs::remove_file(dest).await.is_ok() {
            tracing::debug!("Removed partial file {}", dest.display());
        }

        result
    }
}

fn build_headers(pairs: &[(String, String)]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!("Skipping malformed request header {}", name),
        }
    }
    headers
}
