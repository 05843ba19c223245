//! Browser layer for page navigation and response capture
//!
//! The orchestrator talks to pages only through the [`Browser`] trait. This
//! module also ships [`HttpBrowser`], a static driver that fetches the
//! document over HTTP and answers page queries with an HTML parser.
//!
//! # Components
//!
//! - `Browser`: navigation, DOM reads, scrolling, hovering, response tap
//! - `HttpBrowser`: reqwest + scraper implementation
//! - `build_http_client`: shared client construction (user agent, proxy)

mod client;
mod document;
mod http;

pub use client::{build_http_client, get_following_redirects, RedirectError};
pub use document::{extract_image_sources, extract_title, matches_selector};
pub use http::HttpBrowser;

use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;

/// One network response observed while a page loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEvent {
    /// Address the response came from
    pub url: String,

    /// Content-Type header value (empty if absent)
    pub content_type: String,

    /// Response body as text
    pub body: String,
}

/// When a navigation counts as finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    /// No network activity for a quiet period
    NetworkIdle,

    /// The document has been parsed
    DomContentLoaded,
}

/// Read-only questions asked of the loaded page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageQuery {
    /// Document title as a JSON string, or null
    Title,

    /// Every image address on the page as a JSON array of strings
    ImageSources,
}

/// A page-driving collaborator
///
/// Implementations must publish each response to every live subscriber.
/// Subscriptions made before `navigate` see the navigation's responses.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Opens a new response subscription
    fn subscribe(&self) -> mpsc::UnboundedReceiver<ResponseEvent>;

    /// Loads `url` and waits for `wait`, failing with
    /// [`NavigationTimeout`](crate::GalleriaError::NavigationTimeout) after `timeout`
    async fn navigate(&self, url: &str, wait: WaitCondition, timeout: Duration) -> Result<()>;

    /// Answers a page query against the current document
    async fn evaluate(&self, query: PageQuery) -> Result<Value>;

    async fn scroll_to_bottom(&self) -> Result<()>;

    async fn measure_page_height(&self) -> Result<u64>;

    /// Hovers the first element matching `selector`
    ///
    /// # Returns
    ///
    /// `false` if nothing matched
    async fn hover(&self, selector: &str) -> Result<bool>;
}
