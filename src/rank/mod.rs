//! Ranking of captured image URLs
//!
//! The ranking filter turns a bag of canonical URLs into the ordered list that
//! gets retrieved: product photography first, largest renditions first.

use crate::config::SiteProfile;
use crate::extract::{ExclusionFilter, OrderedSet};
use crate::url::{extract_host, find_markers, is_cdn_url, size_rank, Canonicalizer};
use crate::ConfigError;
use regex::Regex;

/// Filters and orders canonical URLs
#[derive(Debug, Clone)]
pub struct RankingFilter {
    cdn_domain: String,
    product_host: Regex,
    product_path_segment: String,
    exclusion: ExclusionFilter,
    canonicalizer: Canonicalizer,
}

impl RankingFilter {
    pub fn new(profile: &SiteProfile) -> Result<Self, ConfigError> {
        let product_host = Regex::new(&format!("^(?i:{})$", profile.product_host_pattern))
            .map_err(|e| ConfigError::InvalidPattern(format!("product-host-pattern: {}", e)))?;

        Ok(Self {
            cdn_domain: profile.cdn_domain.clone(),
            product_host,
            product_path_segment: profile.product_path_segment.clone(),
            exclusion: ExclusionFilter::new(profile),
            canonicalizer: Canonicalizer::new(profile),
        })
    }

    /// Ranks candidates, highest quality first
    ///
    /// # Ranking Steps
    ///
    /// 1. Keep CDN-hosted URLs
    /// 2. Drop anything the exclusion filter matches
    /// 3. Keep product-grade URLs: a high-res marker, a product-image host,
    ///    or the product path without a doubled size marker
    /// 4. Sort by size rank descending; on equal rank the product path wins,
    ///    then input order
    /// 5. With no product-grade URLs, return [`fallback`](Self::fallback)
    pub fn rank(&self, candidates: &[String]) -> Vec<String> {
        let mut seen = OrderedSet::default();
        let mut graded: Vec<(u32, bool, &String)> = Vec::new();

        for url in candidates {
            if !self.is_usable(url) || !self.is_product_grade(url) || !seen.insert(url) {
                continue;
            }
            graded.push((size_rank(url), self.on_product_path(url), url));
        }

        if graded.is_empty() {
            let fallback = self.fallback(candidates);
            if !fallback.is_empty() {
                tracing::warn!(
                    "No product-grade URLs among {} candidates, using {} unranked CDN URLs",
                    candidates.len(),
                    fallback.len()
                );
            }
            return fallback;
        }

        // Stable: equal keys keep input order
        graded.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));

        graded.into_iter().map(|(_, _, url)| url.clone()).collect()
    }

    /// Any CDN-hosted, non-excluded URL, unique, in input order
    pub fn fallback(&self, candidates: &[String]) -> Vec<String> {
        let mut seen = OrderedSet::default();
        for url in candidates {
            if self.is_usable(url) {
                seen.insert(url);
            }
        }
        seen.to_vec()
    }

    fn is_usable(&self, url: &str) -> bool {
        is_cdn_url(url, &self.cdn_domain) && !self.exclusion.is_excluded(url)
    }

    fn is_product_grade(&self, url: &str) -> bool {
        if self.canonicalizer.has_high_res_marker(url) {
            return true;
        }

        let on_product_host = extract_host(url)
            .map(|host| self.product_host.is_match(&host))
            .unwrap_or(false);
        if on_product_host {
            return true;
        }

        // Two markers mean a corrupted double substitution
        self.on_product_path(url) && find_markers(url).len() < 2
    }

    fn on_product_path(&self, url: &str) -> bool {
        url.contains(&self.product_path_segment)
    }
}
