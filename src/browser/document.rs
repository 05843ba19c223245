//! Static HTML reads for the HTTP page driver
//!
//! This module answers page queries against a fetched document:
//! - Page title (`<title>`, then `og:title`)
//! - Image sources from `<img>`, lazy-load attributes and `srcset`
//! - Whether a selector matches anything

use scraper::{Html, Selector};
use url::Url;

/// Attributes that carry an image address on `<img>` and lazy-load wrappers
const IMAGE_ATTRS: &[&str] = &["src", "data-src", "data-lazy-src", "data-original", "data-zoom"];

/// Extracts the page title from the HTML document
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let from_title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    });

    from_title.or_else(|| {
        let selector = Selector::parse("meta[property='og:title'][content]").ok()?;
        document
            .select(&selector)
            .next()
            .and_then(|element| element.value().attr("content"))
            .map(|content| content.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Collects every image address on the page, resolved against `base_url`
///
/// Order follows the document; duplicates are kept for the extraction engine
/// to collapse.
pub fn extract_image_sources(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut sources = Vec::new();

    if let Ok(selector) = Selector::parse("img, [data-src], [data-zoom]") {
        for element in document.select(&selector) {
            for attr in IMAGE_ATTRS {
                if let Some(value) = element.value().attr(attr) {
                    sources.extend(resolve_source(value, base_url));
                }
            }

            if let Some(srcset) = element.value().attr("srcset") {
                // "a.jpg 1x, b.jpg 2x" -> each address before its descriptor
                for candidate in srcset.split(',') {
                    if let Some(address) = candidate.split_whitespace().next() {
                        sources.extend(resolve_source(address, base_url));
                    }
                }
            }
        }
    }

    sources
}

/// Returns true if `selector` matches at least one element
///
/// An unparsable selector matches nothing.
pub fn matches_selector(html: &str, selector: &str) -> bool {
    let Ok(selector) = Selector::parse(selector) else {
        tracing::debug!("Ignoring unparsable selector {}", selector);
        return false;
    };

    Html::parse_document(html).select(&selector).next().is_some()
}

/// Resolves an attribute value to an absolute http(s) address
///
/// Returns None for empty values, `data:` literals and anything that does not
/// resolve to http or https.
fn resolve_source(value: &str, base_url: &Url) -> Option<String> {
    let value = value.trim();

    if value.is_empty() || value.starts_with("data:") || value.starts_with("javascript:") {
        return None;
    }

    match base_url.join(value) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}
