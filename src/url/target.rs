use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use url::Url;

/// Key used when no product id can be found
pub const UNKNOWN_TARGET: &str = "unknown";

/// Query parameters that carry a product id on the storefront
const ID_PARAMS: &[&str] = &["productId", "offerId", "itemId", "id"];

/// Payload keys that carry a product id
const PAYLOAD_ID_KEYS: &[&str] = &["productId", "offerId", "itemId"];

/// Product pages end in `..._<digits>.html` or `/<digits>.html`
static PATH_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_/-](\d{6,})\.html?$").unwrap());

/// Characters that cannot appear in a file or directory name
const HOSTILE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Longest sanitized name, in characters
const MAX_NAME_CHARS: usize = 80;

/// Derives the crawl-target id from a target address
///
/// Query parameters win over the path. Anything unrecognized, including an
/// address that does not parse, yields [`UNKNOWN_TARGET`].
///
/// # Examples
///
/// ```
/// use galleria::url::extract_target_id;
///
/// assert_eq!(
///     extract_target_id("https://www.alibaba.com/product-detail/Steel-Mug_1600123456789.html"),
///     "1600123456789"
/// );
/// assert_eq!(extract_target_id("https://example.com/"), "unknown");
/// ```
pub fn extract_target_id(address: &str) -> String {
    let Ok(url) = Url::parse(address.trim()) else {
        return UNKNOWN_TARGET.to_string();
    };

    for param in ID_PARAMS {
        let value = url
            .query_pairs()
            .find(|(key, _)| key == param)
            .map(|(_, value)| value.into_owned());
        if let Some(value) = value {
            if is_plain_id(&value) {
                return value;
            }
        }
    }

    PATH_ID_PATTERN
        .captures(url.path())
        .map(|caps| caps[1].to_string())
        .unwrap_or_else(|| UNKNOWN_TARGET.to_string())
}

/// Finds a product id inside a structured response payload
///
/// Walks objects and arrays depth first and returns the first
/// `productId`/`offerId`/`itemId` whose value is a number or an
/// alphanumeric string.
pub fn target_id_from_payload(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => {
            for key in PAYLOAD_ID_KEYS {
                let id = match map.get(*key) {
                    Some(Value::String(s)) => Some(s.trim().to_string()),
                    Some(Value::Number(n)) => Some(n.to_string()),
                    _ => None,
                };
                if let Some(id) = id.filter(|id| is_plain_id(id)) {
                    return Some(id);
                }
            }
            map.values().find_map(target_id_from_payload)
        }
        Value::Array(items) => items.iter().find_map(target_id_from_payload),
        _ => None,
    }
}

fn is_plain_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Makes a string safe to use as a single path component
///
/// Path-hostile characters, control characters and whitespace become `_`,
/// runs of `_` collapse to one, leading/trailing `_` and `.` are dropped, and
/// the result is capped at 80 characters. An empty result becomes `untitled`.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());

    for c in name.chars() {
        let c = if HOSTILE_CHARS.contains(&c) || c.is_control() || c.is_whitespace() {
            '_'
        } else {
            c
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed: String = out
        .trim_matches(|c| c == '_' || c == '.')
        .chars()
        .take(MAX_NAME_CHARS)
        .collect();
    let trimmed = trimmed.trim_end_matches(|c| c == '_' || c == '.');

    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}
