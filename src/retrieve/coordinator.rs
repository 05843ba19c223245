use crate::config::Config;
use crate::extract::OrderedSet;
use crate::retrieve::transfer::{FileTransfer, TransferOptions};
use crate::url::{sanitize_filename, strip_markers};
use crate::{GalleriaError, Result};
use rand::Rng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Extension used when the URL does not reveal a known one
const DEFAULT_EXTENSION: &str = ".jpg";

/// One item that could not be retrieved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievalFailure {
    pub url: String,
    pub error: String,
}

/// Outcome of retrieving a batch of URLs for one target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetrievalReport {
    /// Stored paths in retrieval order
    pub succeeded: Vec<PathBuf>,

    /// Items that failed, with their error message
    pub failed: Vec<RetrievalFailure>,

    /// Input URLs dropped as repeats
    pub duplicates: usize,
}

/// Retrieves image URLs to disk one at a time with randomized pacing
pub struct RetrievalCoordinator {
    transfer: Arc<dyn FileTransfer>,
    download_root: PathBuf,
    min_pacing_ms: u64,
    max_pacing_ms: u64,
    options: TransferOptions,
    image_extensions: Vec<String>,
}

impl RetrievalCoordinator {
    /// Creates a coordinator writing under `config.retrieval.download_root`
    pub fn new(config: &Config, transfer: Arc<dyn FileTransfer>) -> Self {
        Self {
            transfer,
            download_root: PathBuf::from(&config.retrieval.download_root),
            min_pacing_ms: config.retrieval.min_pacing_ms,
            max_pacing_ms: config.retrieval.max_pacing_ms,
            options: TransferOptions {
                max_bytes: config.retrieval.max_bytes,
                max_redirects: config.retrieval.max_redirects,
                headers: vec![("User-Agent".to_string(), config.browser.user_agent.clone())],
            },
            image_extensions: config
                .site
                .image_extensions
                .iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Retrieves every unique URL for a target
    ///
    /// # Arguments
    ///
    /// * `urls` - Ranked URLs; repeats are dropped, first occurrence wins
    /// * `target_id` - Names the per-target directory
    /// * `display_name` - Base for file names, numbered from 1
    /// * `referer` - Page address sent as the Referer header, if any
    ///
    /// # Returns
    ///
    /// A report with stored paths and per-item failures. A failed item never
    /// stops the batch.
    pub async fn retrieve_all(
        &self,
        urls: &[String],
        target_id: &str,
        display_name: &str,
        referer: Option<&str>,
    ) -> RetrievalReport {
        let mut unique = OrderedSet::default();
        for url in urls {
            unique.insert(url);
        }
        let unique = unique.to_vec();

        let mut report = RetrievalReport {
            duplicates: urls.len() - unique.len(),
            ..Default::default()
        };
        if report.duplicates > 0 {
            tracing::info!("Dropped {} duplicate URLs for {}", report.duplicates, target_id);
        }

        let mut options = self.options.clone();
        if let Some(referer) = referer {
            options
                .headers
                .push(("Referer".to_string(), referer.to_string()));
        }

        let target_dir = self.download_root.join(sanitize_filename(target_id));
        let base_name = sanitize_filename(display_name);

        for (index, url) in unique.iter().enumerate() {
            let extension = derive_extension(url, &self.image_extensions);
            let dest = target_dir.join(format!("{}_{}{}", base_name, index + 1, extension));

            match self.retrieve_one(url, &dest, &options).await {
                Ok(path) => {
                    tracing::info!("[{}/{}] Saved {}", index + 1, unique.len(), path.display());
                    report.succeeded.push(path);
                }
                Err(e) => {
                    tracing::warn!("[{}/{}] Failed {}: {}", index + 1, unique.len(), url, e);
                    report.failed.push(RetrievalFailure {
                        url: url.clone(),
                        error: e.to_string(),
                    });
                }
            }

            tokio::time::sleep(pacing_interval(self.min_pacing_ms, self.max_pacing_ms)).await;
        }

        tracing::info!(
            "Retrieved {} of {} images for {} ({} failed)",
            report.succeeded.len(),
            unique.len(),
            target_id,
            report.failed.len()
        );

        report
    }

    /// Retrieves a single URL to `dest`
    ///
    /// An existing file at `dest` counts as success without a fetch. On any
    /// transfer error the partial file is removed.
    pub async fn retrieve_one(
        &self,
        url: &str,
        dest: &Path,
        options: &TransferOptions,
    ) -> Result<PathBuf> {
        ::url::Url::parse(url).map_err(|e| GalleriaError::Validation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if tokio::fs::try_exists(dest).await? {
            tracing::debug!("Skipping {}, {} already exists", url, dest.display());
            return Ok(dest.to_path_buf());
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        match self.transfer.fetch_to_file(url, dest, options).await {
            Ok(bytes) => {
                tracing::debug!("Wrote {} bytes from {}", bytes, url);
                Ok(dest.to_path_buf())
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(dest).await;
                Err(e.for_url(url))
            }
        }
    }
}

/// Uniformly random pause in `[min_ms, max_ms]`
pub fn pacing_interval(min_ms: u64, max_ms: u64) -> Duration {
    let ms = if max_ms > min_ms {
        rand::thread_rng().gen_range(min_ms..=max_ms)
    } else {
        min_ms
    };
    Duration::from_millis(ms)
}

/// Picks the file extension for a URL
///
/// Size markers are stripped from the last path segment first, so
/// `img_960x960q80.jpg` gives `.jpg`. Unknown or missing extensions fall back
/// to `.jpg`.
pub fn derive_extension(url: &str, known: &[String]) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    let stripped = strip_markers(last_segment);

    stripped
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| known.iter().any(|k| k == ext))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
