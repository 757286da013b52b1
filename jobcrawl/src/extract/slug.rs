//! URL slugs for synthesized posting links.

use regex::Regex;
use std::sync::LazyLock;

static NON_SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s-]").expect("valid regex"));

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static DASHES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").expect("valid regex"));

/// Maximum title slug length.
pub const TITLE_SLUG_MAX: usize = 80;

/// Maximum company slug length.
pub const COMPANY_SLUG_MAX: usize = 40;

/// Normalizes free text into a URL-safe token.
///
/// Lowercases, drops everything but ASCII word characters, whitespace and
/// hyphens, turns whitespace runs into single hyphens, trims hyphens at both
/// ends and truncates to `max_len` characters. Missing text, or text with
/// nothing slug-worthy in it, yields `placeholder`.
#[must_use]
pub fn slugify(text: Option<&str>, max_len: usize, placeholder: &str) -> String {
    let Some(text) = text else {
        return placeholder.to_string();
    };

    let lowered = text.to_lowercase();
    let slug = NON_SLUG_RE.replace_all(&lowered, "");
    let slug = WHITESPACE_RE.replace_all(&slug, "-");
    let slug = DASHES_RE.replace_all(&slug, "-");
    let slug: String = slug.trim_matches('-').chars().take(max_len).collect();

    if slug.is_empty() {
        placeholder.to_string()
    } else {
        slug
    }
}
