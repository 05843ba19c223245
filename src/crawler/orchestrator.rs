//! Crawl orchestrator - per-target lifecycle and batch runs
//!
//! One target at a time:
//! - Subscribe a response tap, then navigate (network idle, falling back to
//!   DOM content loaded on timeout)
//! - Read the display name, simulate a visitor, scroll until the page stops
//!   growing, settle
//! - Select URLs and retrieve them
//! - Retry the whole attempt with linear backoff

use crate::browser::{Browser, PageQuery, WaitCondition};
use crate::config::{Config, CrawlConfig};
use crate::crawler::result::{CrawlAttemptResult, TargetOutcome};
use crate::crawler::tap::ResponseTap;
use crate::extract::ExtractionEngine;
use crate::rank::RankingFilter;
use crate::retrieve::{pacing_interval, FileTransfer, RetrievalCoordinator};
use crate::state::{CrawlState, StateTracker};
use crate::url::extract_target_id;
use crate::{GalleriaError, Result};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Drives targets through the crawl lifecycle
pub struct CrawlOrchestrator {
    browser: Arc<dyn Browser>,
    engine: ExtractionEngine,
    ranking: RankingFilter,
    retrieval: RetrievalCoordinator,
    crawl: CrawlConfig,
    navigation_timeout: Duration,
    min_pacing_ms: u64,
    max_pacing_ms: u64,
}

impl CrawlOrchestrator {
    /// Creates an orchestrator over the given collaborators
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `browser` - Page driver
    /// * `transfer` - File transfer used for retrieval
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOrchestrator)` - Ready to run targets
    /// * `Err(GalleriaError)` - A site pattern failed to compile
    pub fn new(
        config: &Config,
        browser: Arc<dyn Browser>,
        transfer: Arc<dyn FileTransfer>,
    ) -> Result<Self> {
        if config.browser.headless {
            tracing::debug!("Headless mode requested");
        }

        Ok(Self {
            browser,
            engine: ExtractionEngine::new(&config.site)?,
            ranking: RankingFilter::new(&config.site)?,
            retrieval: RetrievalCoordinator::new(config, transfer),
            crawl: config.crawl.clone(),
            navigation_timeout: Duration::from_millis(config.browser.timeout_ms),
            min_pacing_ms: config.retrieval.min_pacing_ms,
            max_pacing_ms: config.retrieval.max_pacing_ms,
        })
    }

    /// The engine shared with the response tap
    pub fn engine(&self) -> &ExtractionEngine {
        &self.engine
    }

    /// Runs every address in order
    ///
    /// The engine is cleared before each target. A target that exhausts its
    /// attempts is recorded as failed and the batch moves on.
    pub async fn run_batch(&self, addresses: &[String]) -> Vec<TargetOutcome> {
        let mut outcomes = Vec::with_capacity(addresses.len());

        for (index, address) in addresses.iter().enumerate() {
            tracing::info!("=== Target {}/{}: {} ===", index + 1, addresses.len(), address);

            self.engine.clear();
            let started_at = Utc::now();
            let result = self.run_target(address).await;

            if let Err(e) = &result {
                tracing::error!("Target {} failed: {}", address, e);
            }

            outcomes.push(TargetOutcome::from_result(
                address,
                &extract_target_id(address),
                started_at,
                result,
            ));
        }

        outcomes
    }

    /// Runs one target with attempt-level retry
    ///
    /// Before attempt `n >= 2` the orchestrator sleeps
    /// `retry_base_delay_ms * (n - 1)`. Every error raised inside an attempt
    /// is retried until the attempt cap is reached.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlAttemptResult)` - An attempt completed (possibly with no images)
    /// * `Err(GalleriaError::Validation)` - The address is not a usable URL
    /// * `Err(GalleriaError::RetryExhausted)` - Every attempt failed
    pub async fn run_target(&self, address: &str) -> Result<CrawlAttemptResult> {
        let parsed = ::url::Url::parse(address).map_err(|e| GalleriaError::Validation {
            url: address.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(GalleriaError::Validation {
                url: address.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let max_attempts = self.crawl.retry_attempts.max(1);
        let mut tracker = StateTracker::new();
        let mut attempt = 1;

        loop {
            tracing::info!("Attempt {}/{} for {}", attempt, max_attempts, address);

            match self.run_attempt(address, attempt, &mut tracker).await {
                Ok(result) => {
                    tracing::debug!("State path for {}: {:?}", address, tracker.history());
                    return Ok(result);
                }
                Err(e) if attempt < max_attempts => {
                    let delay = Duration::from_millis(
                        self.crawl.retry_base_delay_ms.saturating_mul(u64::from(attempt)),
                    );
                    tracing::warn!(
                        "Attempt {} for {} failed in state {}: {} (retrying in {}ms)",
                        attempt,
                        address,
                        tracker.current(),
                        e,
                        delay.as_millis()
                    );

                    tracker.advance(CrawlState::Retrying)?;
                    tokio::time::sleep(delay).await;
                    tracker.advance(CrawlState::Navigating)?;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!("Attempt {} for {} failed: {}", attempt, address, e);
                    tracker.advance(CrawlState::Failed)?;
                    tracing::debug!("State path for {}: {:?}", address, tracker.history());
                    return Err(GalleriaError::RetryExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
            }
        }
    }

    /// Runs a single attempt, leaving `tracker` in `Done` on success
    async fn run_attempt(
        &self,
        address: &str,
        attempt: u32,
        tracker: &mut StateTracker,
    ) -> Result<CrawlAttemptResult> {
        let target_id = extract_target_id(address);

        // Subscribed before navigation so the document response is seen
        let tap = ResponseTap::start(self.browser.subscribe(), self.engine.clone(), target_id.clone());
        let loaded = self.load_page(address, &target_id, tracker).await;
        let summary = tap.stop().await;
        let display_name = loaded?;

        tracing::debug!("Response tap processed {} responses", summary.responses);

        tracker.advance(CrawlState::SelectingUrls)?;
        let urls = self.select_urls(&target_id);

        // Captures stay keyed by the address-derived id; the discovered one names the output
        let target_id = summary.discovered_target_id.unwrap_or(target_id);
        let total_candidates_found = self.engine.total_count();

        if urls.is_empty() {
            tracing::warn!("No image URLs found for {}", address);
            tracker.advance(CrawlState::Done)?;
            return Ok(CrawlAttemptResult {
                success: false,
                target_id,
                display_name,
                retrieved_paths: Vec::new(),
                total_candidates_found,
                failures: Vec::new(),
                attempts: attempt,
            });
        }

        tracker.advance(CrawlState::Retrieving)?;
        tracing::info!("Retrieving {} images for {}", urls.len(), display_name);
        let report = self
            .retrieval
            .retrieve_all(&urls, &target_id, &display_name, Some(address))
            .await;

        tracker.advance(CrawlState::Done)?;

        Ok(CrawlAttemptResult {
            success: !report.succeeded.is_empty(),
            target_id,
            display_name,
            retrieved_paths: report.succeeded,
            total_candidates_found,
            failures: report.failed,
            attempts: attempt,
        })
    }

    /// Navigating through Settling; returns the display name
    async fn load_page(
        &self,
        address: &str,
        target_id: &str,
        tracker: &mut StateTracker,
    ) -> Result<String> {
        tracing::info!("Navigating to {}", address);
        self.navigate_with_fallback(address).await?;

        tracker.advance(CrawlState::ExtractingInfo)?;
        let display_name = self.read_display_name(target_id).await?;
        tracing::info!("Target {} is \"{}\"", target_id, display_name);

        tracker.advance(CrawlState::SimulatingPresence)?;
        self.browser.hover("body").await?;
        tokio::time::sleep(pacing_interval(self.min_pacing_ms, self.max_pacing_ms)).await;

        tracker.advance(CrawlState::LazyLoadScrolling)?;
        let rounds = self.scroll_until_stable().await?;
        tracing::info!("Page stable after {} scroll rounds", rounds);

        tracker.advance(CrawlState::Settling)?;
        tokio::time::sleep(Duration::from_millis(self.crawl.settle_delay_ms)).await;
        let sources = self.browser.evaluate(PageQuery::ImageSources).await?;
        if self.engine.extract_structured(&sources, Some(target_id)) {
            tracing::debug!("DOM pass found new image URLs");
        }

        Ok(display_name)
    }

    async fn navigate_with_fallback(&self, address: &str) -> Result<()> {
        match self
            .browser
            .navigate(address, WaitCondition::NetworkIdle, self.navigation_timeout)
            .await
        {
            Err(GalleriaError::NavigationTimeout { .. }) => {
                tracing::warn!("Network never went idle on {}, waiting for DOM content", address);
                self.browser
                    .navigate(address, WaitCondition::DomContentLoaded, self.navigation_timeout)
                    .await
            }
            other => other,
        }
    }

    async fn read_display_name(&self, target_id: &str) -> Result<String> {
        let title = self.browser.evaluate(PageQuery::Title).await?;

        Ok(match title {
            Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => target_id.to_string(),
        })
    }

    /// Scrolls until two consecutive height readings match
    ///
    /// # Returns
    ///
    /// The number of scroll rounds performed (at most `max_scroll_rounds`)
    async fn scroll_until_stable(&self) -> Result<u32> {
        let mut height = self.browser.measure_page_height().await?;
        let mut rounds = 0;

        while rounds < self.crawl.max_scroll_rounds {
            self.browser.scroll_to_bottom().await?;
            tokio::time::sleep(Duration::from_millis(self.crawl.scroll_delay_ms)).await;

            for selector in &self.crawl.gallery_selectors {
                if self.browser.hover(selector).await? {
                    tracing::trace!("Hovered {}", selector);
                }
            }
            rounds += 1;

            let next = self.browser.measure_page_height().await?;
            tracing::debug!("Scroll round {}: height {} -> {}", rounds, height, next);
            if next == height {
                return Ok(rounds);
            }
            height = next;
        }

        tracing::warn!(
            "Page still growing after {} scroll rounds, moving on",
            self.crawl.max_scroll_rounds
        );
        Ok(rounds)
    }

    /// Target URLs, else ranked global URLs, else any usable global URL
    fn select_urls(&self, target_id: &str) -> Vec<String> {
        let target_urls = self.engine.target_urls(target_id);
        if !target_urls.is_empty() {
            tracing::info!("Selected {} URLs captured for {}", target_urls.len(), target_id);
            return target_urls;
        }

        let all_urls = self.engine.all_urls();
        let ranked = self.ranking.rank(&all_urls);
        if !ranked.is_empty() {
            tracing::warn!(
                "Nothing captured under {}, using {} ranked URLs from the global set",
                target_id,
                ranked.len()
            );
            return ranked;
        }

        let fallback = self.ranking.fallback(&all_urls);
        if !fallback.is_empty() {
            tracing::warn!("Using {} unranked CDN URLs for {}", fallback.len(), target_id);
        }
        fallback
    }
}
