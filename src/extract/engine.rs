use crate::config::SiteProfile;
use crate::extract::patterns::{ExclusionFilter, PatternSet};
use crate::extract::store::ExtractionStore;
use crate::url::{is_cdn_url, Canonicalizer, UNKNOWN_TARGET};
use crate::ConfigError;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

/// Content types whose bodies are never scanned
const BINARY_PREFIXES: &[&str] = &["image/", "font/", "video/", "audio/"];

/// Scans response payloads for image URLs and accumulates canonical results
///
/// The engine is a cheap handle: clones share the same store, so the response
/// tap can feed it while the orchestrator reads from another clone.
#[derive(Debug, Clone)]
pub struct ExtractionEngine {
    inner: Arc<EngineInner>,
}

#[derive(Debug)]
struct EngineInner {
    patterns: PatternSet,
    exclusion: ExclusionFilter,
    canonicalizer: Canonicalizer,
    cdn_domain: String,
    store: Mutex<ExtractionStore>,
}

impl ExtractionEngine {
    /// Creates an engine with an empty store
    pub fn new(profile: &SiteProfile) -> Result<Self, ConfigError> {
        Ok(Self {
            inner: Arc::new(EngineInner {
                patterns: PatternSet::new(profile)?,
                exclusion: ExclusionFilter::new(profile),
                canonicalizer: Canonicalizer::new(profile),
                cdn_domain: profile.cdn_domain.clone(),
                store: Mutex::new(ExtractionStore::new()),
            }),
        })
    }

    /// Scans payload text and records every relevant image URL
    ///
    /// Candidates go through the exclusion filter first, then the
    /// canonicalizer; only CDN-hosted results are kept. URLs are stored under
    /// `target_id` (or `"unknown"`) and in the global set.
    ///
    /// # Returns
    ///
    /// `true` if at least one URL was new for the target
    pub fn extract(&self, payload: &str, target_id: Option<&str>) -> bool {
        let text = unescape_payload(payload);
        let key = target_id.unwrap_or(UNKNOWN_TARGET);

        let mut accepted = Vec::new();
        for (kind, raw) in self.inner.patterns.candidates(&text) {
            if self.inner.exclusion.is_excluded(raw) {
                tracing::trace!("Excluded {:?} candidate {}", kind, raw);
                continue;
            }

            let Some(canonical) = self.inner.canonicalizer.canonicalize(raw) else {
                tracing::trace!("Rejected {:?} candidate {}", kind, raw);
                continue;
            };

            if !is_cdn_url(&canonical, &self.inner.cdn_domain) {
                continue;
            }

            accepted.push(canonical);
        }

        if accepted.is_empty() {
            return false;
        }

        let mut store = self.store();
        let mut captured = 0;
        for url in &accepted {
            if store.insert(key, url) {
                tracing::debug!("Captured {} for target {}", url, key);
                captured += 1;
            }
        }

        captured > 0
    }

    /// Serializes a structured payload and scans the text
    pub fn extract_structured(&self, value: &Value, target_id: Option<&str>) -> bool {
        self.extract(&value.to_string(), target_id)
    }

    /// Routes a network response body to the right extraction path
    ///
    /// JSON bodies are parsed and scanned as structured values. A body that
    /// claims to be JSON but does not parse (JSONP wrappers, truncated
    /// payloads) is scanned as plain text instead. Binary content is skipped.
    pub fn extract_response(&self, content_type: &str, body: &str, target_id: Option<&str>) -> bool {
        let content_type = content_type.to_ascii_lowercase();
        if BINARY_PREFIXES.iter().any(|p| content_type.starts_with(p)) {
            return false;
        }

        let looks_structured = content_type.contains("json") || {
            let head = body.trim_start();
            head.starts_with('{') || head.starts_with('[')
        };

        if looks_structured {
            match serde_json::from_str::<Value>(body) {
                Ok(value) => return self.extract_structured(&value, target_id),
                Err(e) => {
                    tracing::trace!("Structured parse failed ({}), scanning as text", e);
                }
            }
        }

        self.extract(body, target_id)
    }

    /// URLs captured for a target, in first-seen order
    pub fn target_urls(&self, target_id: &str) -> Vec<String> {
        self.store().target_urls(target_id)
    }

    /// Every URL captured since the last clear, in first-seen order
    pub fn all_urls(&self) -> Vec<String> {
        self.store().all_urls()
    }

    pub fn target_count(&self, target_id: &str) -> usize {
        self.store().target_count(target_id)
    }

    pub fn total_count(&self) -> usize {
        self.store().total_count()
    }

    /// Forgets everything captured so far
    pub fn clear(&self) {
        self.store().clear();
    }

    fn store(&self) -> MutexGuard<'_, ExtractionStore> {
        // The store holds plain sets; a panic mid-insert leaves it usable
        self.inner
            .store
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Undoes the escaping that JSON and HTML attributes apply to URLs
fn unescape_payload(payload: &str) -> String {
    payload
        .replace("\\/", "/")
        .replace("\\u002F", "/")
        .replace("\\u002f", "/")
        .replace("\\u0026", "&")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}
