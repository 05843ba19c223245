use serde::Deserialize;

/// Main configuration structure for Galleria
///
/// Every section is optional in the TOML file; missing keys take the
/// defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub crawl: CrawlConfig,
    pub retrieval: RetrievalConfig,
    pub proxy: Option<ProxyConfig>,
    pub site: SiteProfile,
}

/// Browser layer configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserConfig {
    /// Run without a visible window
    pub headless: bool,

    /// Upper bound for a single navigation (milliseconds)
    pub timeout_ms: u64,

    /// User agent presented to the site and the CDN
    pub user_agent: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            timeout_ms: 30_000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Per-target crawl loop configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Whole-attempt cap per target
    pub retry_attempts: u32,

    /// Backoff unit; attempt n waits `base * (n - 1)`
    pub retry_base_delay_ms: u64,

    /// Wait after the lazy-load loop so in-flight responses land
    pub settle_delay_ms: u64,

    /// Wait after each scroll before re-measuring
    pub scroll_delay_ms: u64,

    /// Hard cap on lazy-load rounds
    pub max_scroll_rounds: u32,

    /// Gallery elements hovered on each lazy-load round
    pub gallery_selectors: Vec<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_base_delay_ms: 2_000,
            settle_delay_ms: 3_000,
            scroll_delay_ms: 1_200,
            max_scroll_rounds: 20,
            gallery_selectors: vec![
                ".image-list-item".to_string(),
                ".detail-gallery-turn-wrapper".to_string(),
                "[data-role='thumb']".to_string(),
            ],
        }
    }
}

/// Image retrieval configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetrievalConfig {
    /// Directory that receives one sub-directory per target
    pub download_root: String,

    /// Lower bound of the randomized pause between items
    pub min_pacing_ms: u64,

    /// Upper bound of the randomized pause between items
    pub max_pacing_ms: u64,

    /// Largest accepted image body
    pub max_bytes: u64,

    /// Redirect hops followed per image
    pub max_redirects: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            download_root: "downloads".to_string(),
            min_pacing_ms: 500,
            max_pacing_ms: 1_500,
            max_bytes: 20 * 1024 * 1024,
            max_redirects: 5,
        }
    }
}

/// Outbound proxy
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    pub server: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Site-specific URL dialect
///
/// These are the heuristics that tie the crawler to one storefront's CDN.
/// Size markers are `WIDTHxHEIGHT` tokens as they appear in image paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteProfile {
    /// CDN host pattern (e.g., "alicdn.com" or "*.alicdn.com")
    pub cdn_domain: String,

    /// Regex a host must fully match to count as a product-image host
    pub product_host_pattern: String,

    /// Path segment under which product photography lives
    pub product_path_segment: String,

    /// Marker written into upgraded URLs
    pub upgrade_marker: String,

    /// Markers that identify an already high-resolution URL
    pub high_res_markers: Vec<String>,

    /// Markers that get replaced with `upgrade_marker`
    pub low_res_markers: Vec<String>,

    /// Markers used only by interface chrome
    pub ui_size_markers: Vec<String>,

    /// Lowercase path fragments of icons, flags, logos and sprites
    pub excluded_path_fragments: Vec<String>,

    /// Image extensions without the dot
    pub image_extensions: Vec<String>,
}

impl Default for SiteProfile {
    fn default() -> Self {
        fn strings(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            cdn_domain: "*.alicdn.com".to_string(),
            product_host_pattern: r"sc?\d+\.alicdn\.com".to_string(),
            product_path_segment: "/kf/".to_string(),
            upgrade_marker: "960x960q80".to_string(),
            high_res_markers: strings(&["960x960", "800x800", "1200x1200", "1600x1600"]),
            low_res_markers: strings(&["50x50", "80x80", "100x100", "120x120", "220x220"]),
            ui_size_markers: strings(&["16x16", "20x20", "24x24", "32x32", "48x48"]),
            excluded_path_fragments: strings(&[
                "/tps/", "/icon", "/flag", "/logo", "/sprite",
            ]),
            image_extensions: strings(&["jpg", "jpeg", "png", "webp"]),
        }
    }
}
