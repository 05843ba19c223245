//! Candidate patterns and the exclusion filter
//!
//! Patterns are compiled from the [`SiteProfile`] so the CDN dialect stays in
//! configuration. The exclusion filter is shared with the ranking filter.

use crate::config::SiteProfile;
use crate::url::{find_markers, parse_marker};
use crate::ConfigError;
use regex::Regex;
use std::sync::LazyLock;

/// Characters that may appear inside a URL token in scraped text
const URL_CHARS: &str = r#"[^\s"'<>()\\,\[\]{}|^`]"#;

/// Numeric-pair tile naming used by sprite sheets and UI badges (`-48-48.png`)
static TILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[-_]\d{1,4}-\d{1,4}\.(?:png|jpe?g|gif|svg|webp)").unwrap());

/// Which pattern produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// CDN host with the product path segment and an image extension
    CdnProductPath,
    /// Any URL on the product-image subdomain
    CdnProductHost,
    /// Any URL with a `_WxH` size marker
    SizeMarker,
    /// Any URL ending in an image extension
    ImageExtension,
}

/// Ordered list of candidate patterns
#[derive(Debug)]
pub struct PatternSet {
    patterns: Vec<(PatternKind, Regex)>,
}

impl PatternSet {
    /// Compiles the pattern list for a site profile
    pub fn new(profile: &SiteProfile) -> Result<Self, ConfigError> {
        let cdn_base = regex::escape(
            profile
                .cdn_domain
                .strip_prefix("*.")
                .unwrap_or(&profile.cdn_domain),
        );
        let segment = regex::escape(&profile.product_path_segment);
        let extensions = profile
            .image_extensions
            .iter()
            .map(|e| regex::escape(e))
            .collect::<Vec<_>>()
            .join("|");

        let sources = [
            (
                PatternKind::CdnProductPath,
                format!(
                    r"(?i)(?:https?:)?//(?:[a-z0-9-]+\.)*{cdn_base}(?:/{u}*?)?{segment}{u}+\.(?:{extensions})(?:\?{u}*)?",
                    u = URL_CHARS
                ),
            ),
            (
                PatternKind::CdnProductHost,
                format!(
                    r"(?i)(?:https?:)?//{host}/{u}+",
                    host = profile.product_host_pattern,
                    u = URL_CHARS
                ),
            ),
            (
                PatternKind::SizeMarker,
                format!(
                    r"(?i)(?:https?:)?//{u}+?_\d{{2,4}}x\d{{2,4}}{u}*",
                    u = URL_CHARS
                ),
            ),
            (
                PatternKind::ImageExtension,
                format!(
                    r"(?i)(?:https?:)?//{u}+\.(?:{extensions})(?:\?{u}*)?",
                    u = URL_CHARS
                ),
            ),
        ];

        let patterns = sources
            .into_iter()
            .map(|(kind, source)| {
                Regex::new(&source)
                    .map(|re| (kind, re))
                    .map_err(|e| ConfigError::InvalidPattern(format!("{:?}: {}", kind, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns })
    }

    /// Runs every pattern over `text` in order
    ///
    /// The same substring may come back once per pattern that matched it.
    pub fn candidates<'t>(&self, text: &'t str) -> Vec<(PatternKind, &'t str)> {
        self.patterns
            .iter()
            .flat_map(|(kind, re)| re.find_iter(text).map(move |m| (*kind, m.as_str())))
            .collect()
    }
}

/// Drops icons, flags, logos, UI-sized renditions and sprite tiles
#[derive(Debug, Clone)]
pub struct ExclusionFilter {
    fragments: Vec<String>,
    ui_markers: Vec<(u32, u32)>,
}

impl ExclusionFilter {
    pub fn new(profile: &SiteProfile) -> Self {
        Self {
            fragments: profile
                .excluded_path_fragments
                .iter()
                .map(|f| f.to_ascii_lowercase())
                .collect(),
            ui_markers: profile
                .ui_size_markers
                .iter()
                .filter_map(|m| parse_marker(m))
                .collect(),
        }
    }

    /// Returns true if the candidate is interface chrome rather than a product image
    pub fn is_excluded(&self, candidate: &str) -> bool {
        let lower = candidate.to_ascii_lowercase();

        if self.fragments.iter().any(|f| lower.contains(f.as_str())) {
            return true;
        }

        let ui_sized = find_markers(candidate)
            .iter()
            .any(|m| self.ui_markers.iter().any(|dims| m.has_dimensions(*dims)));
        if ui_sized {
            return true;
        }

        TILE_PATTERN.is_match(candidate)
    }
}
