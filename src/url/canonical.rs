use crate::config::SiteProfile;
use crate::url::markers::{find_markers, parse_marker, SizeMarker};
use crate::url::matches_wildcard;
use url::Url;

/// Characters stripped from both ends of a raw candidate
const QUOTE_CHARS: &[char] = &['"', '\'', '`'];

/// Turns raw candidate strings into canonical high-resolution URLs
///
/// # Canonicalization Steps
///
/// 1. Trim quotes and whitespace; give protocol-relative values `https:`
/// 2. Reject `data:` literals and anything that is not an http(s) URL
/// 3. A URL carrying a high-res marker is returned unchanged
/// 4. A low-res marker in the path is swapped for the upgrade marker
/// 5. A bare CDN image (no marker at all) gets `_<upgrade>.<ext>` appended
/// 6. Anything else is returned unchanged
///
/// Steps 4 and 5 only touch the part before the first `?`. Query strings on
/// this CDN carry signing tokens and must survive byte for byte.
///
/// Canonicalization is idempotent: feeding a result back in returns it as is.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    cdn_domain: String,
    upgrade_marker: String,
    high_res: Vec<(u32, u32)>,
    low_res: Vec<(u32, u32)>,
    extensions: Vec<String>,
}

impl Canonicalizer {
    /// Builds a canonicalizer from the site profile
    ///
    /// Markers that fail to parse are skipped; `validate` rejects them before
    /// a profile ever gets here.
    pub fn new(profile: &SiteProfile) -> Self {
        Self {
            cdn_domain: profile.cdn_domain.clone(),
            upgrade_marker: profile.upgrade_marker.clone(),
            high_res: profile
                .high_res_markers
                .iter()
                .filter_map(|m| parse_marker(m))
                .collect(),
            low_res: profile
                .low_res_markers
                .iter()
                .filter_map(|m| parse_marker(m))
                .collect(),
            extensions: profile
                .image_extensions
                .iter()
                .map(|e| e.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Canonicalizes a raw candidate
    ///
    /// # Returns
    ///
    /// * `Some(String)` - The canonical URL
    /// * `None` - The candidate is a data literal or not a usable URL
    ///
    /// # Examples
    ///
    /// ```
    /// use galleria::config::SiteProfile;
    /// use galleria::url::Canonicalizer;
    ///
    /// let canon = Canonicalizer::new(&SiteProfile::default());
    /// assert_eq!(
    ///     canon.canonicalize("https://sc04.alicdn.com/kf/H1.jpg_50x50.jpg?sig=a_50x50").as_deref(),
    ///     Some("https://sc04.alicdn.com/kf/H1.jpg_960x960q80.jpg?sig=a_50x50")
    /// );
    /// ```
    pub fn canonicalize(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || QUOTE_CHARS.contains(&c));
        if trimmed.is_empty() || is_data_literal(trimmed) {
            return None;
        }

        let candidate = if trimmed.starts_with("//") {
            format!("https:{}", trimmed)
        } else {
            trimmed.to_string()
        };

        let parsed = Url::parse(&candidate).ok()?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return None;
        }
        let host = parsed.host_str()?;

        let markers = find_markers(&candidate);
        if markers.iter().any(|m| self.is_high_res(m)) {
            return Some(candidate);
        }

        let (path, query) = split_query(&candidate);

        if let Some(low) = find_markers(path).into_iter().find(|m| self.is_low_res(m)) {
            let upgraded = format!(
                "{}{}{}",
                &path[..low.start],
                self.upgrade_marker,
                &path[low.end..]
            );
            return Some(join_query(upgraded, query));
        }

        if markers.is_empty() && matches_wildcard(&self.cdn_domain, host) {
            if let Some(ext) = self.image_extension(path) {
                let appended = format!("{}_{}.{}", path, self.upgrade_marker, ext);
                return Some(join_query(appended, query));
            }
        }

        Some(candidate)
    }

    /// Returns true if the marker is one of the configured high-res sizes
    pub fn is_high_res(&self, marker: &SizeMarker) -> bool {
        self.high_res.iter().any(|dims| marker.has_dimensions(*dims))
    }

    /// Returns true if the marker is one of the configured low-res sizes
    pub fn is_low_res(&self, marker: &SizeMarker) -> bool {
        self.low_res.iter().any(|dims| marker.has_dimensions(*dims))
    }

    /// Returns true if the URL carries a high-res marker anywhere
    pub fn has_high_res_marker(&self, url: &str) -> bool {
        find_markers(url).iter().any(|m| self.is_high_res(m))
    }

    /// Returns the lowercase extension of the last path segment if it is a
    /// recognized image extension
    fn image_extension(&self, path: &str) -> Option<String> {
        let segment = path.rsplit('/').next()?;
        let (_, ext) = segment.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        self.extensions.contains(&ext).then_some(ext)
    }
}

fn is_data_literal(value: &str) -> bool {
    value
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"))
}

/// Splits at the first `?`; the query keeps no leading `?`
fn split_query(url: &str) -> (&str, Option<&str>) {
    match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    }
}

fn join_query(path: String, query: Option<&str>) -> String {
    match query {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    }
}
