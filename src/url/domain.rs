use url::Url;

/// Extracts the lowercase host from a URL string
///
/// Returns `None` when the string does not parse or carries no host.
///
/// # Examples
///
/// ```
/// use galleria::url::extract_host;
///
/// assert_eq!(
///     extract_host("https://SC04.alicdn.com/kf/H1.jpg"),
///     Some("sc04.alicdn.com".to_string())
/// );
/// assert_eq!(extract_host("not a url"), None);
/// ```
pub fn extract_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|h| h.to_ascii_lowercase())
}

/// Returns true if the URL's host lies under the CDN domain pattern
pub fn is_cdn_url(url: &str, cdn_domain: &str) -> bool {
    extract_host(url)
        .map(|host| super::matches_wildcard(cdn_domain, &host))
        .unwrap_or(false)
}
