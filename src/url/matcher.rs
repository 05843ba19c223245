/// Checks if a host matches a CDN domain pattern
///
/// Two pattern shapes are supported:
/// 1. Exact: "alicdn.com" matches only "alicdn.com"
/// 2. Wildcard: "*.alicdn.com" matches the bare domain and any subdomain
///    ("sc04.alicdn.com", "img.s.alicdn.com")
///
/// Comparison ignores ASCII case, since hosts pulled out of payload text are
/// not guaranteed to be lowercase.
///
/// # Examples
///
/// ```
/// use galleria::url::matches_wildcard;
///
/// assert!(matches_wildcard("*.alicdn.com", "sc04.alicdn.com"));
/// assert!(matches_wildcard("*.alicdn.com", "alicdn.com"));
/// assert!(!matches_wildcard("*.alicdn.com", "notalicdn.com"));
/// assert!(!matches_wildcard("alicdn.com", "sc04.alicdn.com"));
/// ```
pub fn matches_wildcard(pattern: &str, host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let pattern = pattern.to_ascii_lowercase();

    match pattern.strip_prefix("*.") {
        Some(base) => host == base || host.ends_with(&format!(".{}", base)),
        None => host == pattern,
    }
}
