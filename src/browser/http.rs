//! Static HTTP page driver
//!
//! Fetches the document with reqwest, publishes it as the only response
//! event, and answers queries from the parsed HTML. Scrolling does nothing and
//! the page height is the document length, so the lazy-load loop settles
//! after one round.

use crate::browser::client::{get_following_redirects, RedirectError};
use crate::browser::document::{extract_image_sources, extract_title, matches_selector};
use crate::browser::{Browser, PageQuery, ResponseEvent, WaitCondition};
use crate::{GalleriaError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

/// The document currently "open" in the driver
#[derive(Debug, Clone)]
struct LoadedPage {
    url: Url,
    html: String,
}

/// Browser implementation backed by plain HTTP requests
#[derive(Debug)]
pub struct HttpBrowser {
    client: Client,
    max_redirects: usize,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ResponseEvent>>>,
    page: Mutex<Option<LoadedPage>>,
}

impl HttpBrowser {
    pub fn new(client: Client, max_redirects: usize) -> Self {
        Self {
            client,
            max_redirects,
            subscribers: Mutex::new(Vec::new()),
            page: Mutex::new(None),
        }
    }

    /// Sends an event to every live subscriber, dropping closed ones
    fn publish(&self, event: ResponseEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn current_page(&self) -> Result<LoadedPage> {
        self.page
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or_else(|| GalleriaError::Browser("no page loaded".to_string()))
    }

    async fn load(&self, url: &str, timeout: Duration) -> Result<LoadedPage> {
        let response = get_following_redirects(&self.client, url, &HeaderMap::new(), self.max_redirects)
            .await
            .map_err(|e| classify_redirect_error(url, timeout, e))?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(GalleriaError::TransientFetch {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }
        if !status.is_success() {
            return Err(GalleriaError::Validation {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let html = response.text().await?;

        self.publish(ResponseEvent {
            url: final_url.to_string(),
            content_type,
            body: html.clone(),
        });

        Ok(LoadedPage { url: final_url, html })
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<ResponseEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(tx);
        rx
    }

    async fn navigate(&self, url: &str, wait: WaitCondition, timeout: Duration) -> Result<()> {
        // A single document response: both conditions hold once it is read
        tracing::debug!("Navigating to {} (wait: {:?})", url, wait);

        let page = match tokio::time::timeout(timeout, self.load(url, timeout)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(GalleriaError::NavigationTimeout {
                    url: url.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        };

        *self.page.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(page);
        Ok(())
    }

    async fn evaluate(&self, query: PageQuery) -> Result<Value> {
        let page = self.current_page()?;

        Ok(match query {
            PageQuery::Title => extract_title(&page.html).map(Value::String).unwrap_or(Value::Null),
            PageQuery::ImageSources => Value::Array(
                extract_image_sources(&page.html, &page.url)
                    .into_iter()
                    .map(Value::String)
                    .collect(),
            ),
        })
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.current_page().map(|_| ())
    }

    async fn measure_page_height(&self) -> Result<u64> {
        Ok(self.current_page()?.html.len() as u64)
    }

    async fn hover(&self, selector: &str) -> Result<bool> {
        Ok(matches_selector(&self.current_page()?.html, selector))
    }
}

fn classify_redirect_error(url: &str, timeout: Duration, error: RedirectError) -> GalleriaError {
    match error {
        RedirectError::Request(e) if e.is_timeout() => GalleriaError::NavigationTimeout {
            url: url.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        },
        RedirectError::Request(e) => GalleriaError::TransientFetch {
            url: url.to_string(),
            message: e.to_string(),
        },
        other => GalleriaError::Validation {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}
