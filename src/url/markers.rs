//! Size marker handling
//!
//! CDN image paths encode a rendition size as a `WIDTHxHEIGHT` token, optionally
//! followed by a JPEG quality (`960x960q80`). A token only counts when it is
//! not glued to other letters or digits, so `150x150` never reads as `50x50`
//! and hash-like names such as `O1CN01x9` are ignored.

use regex::Regex;
use std::sync::LazyLock;

static MARKER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2,4})x(\d{2,4})(?:q(\d{1,3}))?").unwrap());

static EXACT_MARKER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2,4})x(\d{2,4})(?:q(\d{1,3}))?$").unwrap());

/// A size marker found inside a string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMarker {
    pub width: u32,
    pub height: u32,
    pub quality: Option<u32>,
    /// Byte offset of the first digit
    pub start: usize,
    /// Byte offset just past the token (including any quality suffix)
    pub end: usize,
}

impl SizeMarker {
    /// Returns true if width and height equal the given dimensions
    pub fn has_dimensions(&self, dims: (u32, u32)) -> bool {
        (self.width, self.height) == dims
    }
}

/// Parses a configured marker such as `"960x960"` or `"960x960q80"`
///
/// Returns the `(width, height)` pair, or `None` if the text is not a marker.
pub fn parse_marker(text: &str) -> Option<(u32, u32)> {
    let caps = EXACT_MARKER_PATTERN.captures(text)?;
    let width = caps[1].parse().ok()?;
    let height = caps[2].parse().ok()?;
    Some((width, height))
}

/// Finds every standalone size marker in `text`, left to right
pub fn find_markers(text: &str) -> Vec<SizeMarker> {
    let bytes = text.as_bytes();

    MARKER_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let (start, end) = (whole.start(), whole.end());

            let glued_before = start > 0 && bytes[start - 1].is_ascii_alphanumeric();
            let glued_after = bytes.get(end).is_some_and(|b| b.is_ascii_alphanumeric());
            if glued_before || glued_after {
                return None;
            }

            Some(SizeMarker {
                width: caps[1].parse().ok()?,
                height: caps[2].parse().ok()?,
                quality: caps.get(3).and_then(|q| q.as_str().parse().ok()),
                start,
                end,
            })
        })
        .collect()
}

/// Numeric size rank of a URL: the widest marker it carries, or 0
pub fn size_rank(url: &str) -> u32 {
    find_markers(url)
        .iter()
        .map(|m| m.width)
        .max()
        .unwrap_or(0)
}

/// Removes every `_WIDTHxHEIGHT[qNN]` token from a file name
///
/// `img_960x960q80.jpg` becomes `img.jpg`, and the CDN's doubled form
/// `H1.jpg_960x960q80.jpg` becomes `H1.jpg.jpg`; either way the last
/// extension is the real one.
pub fn strip_markers(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut cursor = 0;

    for marker in find_markers(name) {
        let cut_start = if marker.start > 0 && name.as_bytes()[marker.start - 1] == b'_' {
            marker.start - 1
        } else {
            marker.start
        };
        if cut_start < cursor {
            continue;
        }
        out.push_str(&name[cursor..cut_start]);
        cursor = marker.end;
    }

    out.push_str(&name[cursor..]);
    out
}
