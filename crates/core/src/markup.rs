//! Markup normalization for rich-text comparison.
//!
//! The rich-text editing surface re-serializes stored markup with cosmetic
//! differences (runs of whitespace, whitespace between or just inside tags)
//! as soon as it loads. [`normalize_markup`] maps such variants onto one
//! canonical string so they do not register as edits.

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static BETWEEN_TAGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("valid regex"));

static AFTER_OPEN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(<[A-Za-z][^>]*>)\s+").expect("valid regex"));

static BEFORE_CLOSE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(</)").expect("valid regex"));

/// Canonicalize markup for equality checks.
///
/// 1. Collapse whitespace runs to a single space.
/// 2. Remove whitespace between adjacent tags.
/// 3. Remove whitespace directly inside an element's opening or closing tag.
/// 4. Trim both ends.
///
/// # Examples
///
/// ```
/// use atelier_core::markup::normalize_markup;
///
/// assert_eq!(normalize_markup("<p>Hello </p>"), "<p>Hello</p>");
/// assert_eq!(normalize_markup("<ul>\n  <li>a</li>\n</ul>"), "<ul><li>a</li></ul>");
/// ```
pub fn normalize_markup(input: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(input, " ");
    let joined = BETWEEN_TAGS_RE.replace_all(&collapsed, "><");
    let opened = AFTER_OPEN_TAG_RE.replace_all(&joined, "$1");
    let closed = BEFORE_CLOSE_TAG_RE.replace_all(&opened, "$1");
    closed.trim().to_string()
}

/// Whether two markup strings are equal after normalization.
pub fn markup_equivalent(a: &str, b: &str) -> bool {
    a == b || normalize_markup(a) == normalize_markup(b)
}
