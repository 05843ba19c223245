//! HTTP client construction and redirect handling
//!
//! Redirects are followed by hand so every caller can apply its own hop limit
//! and see loops before the client does.

use crate::config::Config;
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{redirect::Policy, Client, Response};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Errors raised while walking a redirect chain
#[derive(Debug, thiserror::Error)]
pub enum RedirectError {
    #[error("redirect loop at {0}")]
    Loop(String),

    #[error("more than {0} redirects")]
    TooMany(usize),

    #[error("redirect without a usable Location header from {0}")]
    BadLocation(String),

    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

/// Builds the HTTP client shared by the page driver and the file transfer
///
/// # Arguments
///
/// * `config` - The full configuration (browser and proxy sections are read)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client (bad proxy URL, TLS setup)
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .user_agent(config.browser.user_agent.clone())
        .timeout(Duration::from_millis(config.browser.timeout_ms))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = &config.proxy {
        let mut upstream = reqwest::Proxy::all(proxy.server.as_str())?;
        if let Some(username) = &proxy.username {
            upstream = upstream.basic_auth(username, proxy.password.as_deref().unwrap_or(""));
        }
        tracing::info!("Routing traffic through proxy {}", proxy.server);
        builder = builder.proxy(upstream);
    }

    builder.build()
}

/// Sends a GET and follows up to `max_redirects` hops
///
/// Returns the first non-redirect response. Visited URLs are tracked so a
/// loop fails fast instead of burning through the hop limit.
pub async fn get_following_redirects(
    client: &Client,
    url: &str,
    headers: &HeaderMap,
    max_redirects: usize,
) -> Result<Response, RedirectError> {
    let mut current = url.to_string();
    let mut visited = HashSet::new();
    visited.insert(current.clone());

    for _ in 0..=max_redirects {
        let response = client.get(&current).headers(headers.clone()).send().await?;

        if !response.status().is_redirection() {
            return Ok(response);
        }

        let next = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|loc| Url::parse(&current).ok()?.join(loc).ok())
            .ok_or_else(|| RedirectError::BadLocation(current.clone()))?
            .to_string();

        tracing::debug!("Redirect {} -> {}", current, next);

        if !visited.insert(next.clone()) {
            return Err(RedirectError::Loop(next));
        }
        current = next;
    }

    Err(RedirectError::TooMany(max_redirects))
}
