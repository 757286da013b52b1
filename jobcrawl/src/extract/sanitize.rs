//! Markup to plain text conversion.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid regex"));

static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("valid regex"));

static UNCLOSED_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<(?:script|style)\b.*\z").expect("valid regex"));

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:nbsp|amp|lt|gt|quot|apos|#39);").expect("valid regex")
});

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

fn decode_entity(entity: &str) -> &str {
    match entity {
        "&nbsp;" => " ",
        "&amp;" => "&",
        "&lt;" => "<",
        "&gt;" => ">",
        "&quot;" => "\"",
        "&#39;" | "&apos;" => "'",
        other => other,
    }
}

/// Converts a markup fragment to whitespace-normalized plain text.
///
/// Script and style blocks and comments are removed with their content,
/// remaining tags become a single space, the common named entities are
/// decoded (unknown entities are kept verbatim), and whitespace runs collapse
/// to one space. A script or style block that is never closed is dropped up
/// to the end of the input.
///
/// Applying the function to its own output returns the same text only when
/// the decoded text contains no tag or entity syntax. Encoded markup such as
/// `&lt;b&gt;` decodes to `<b>`, which a second pass strips as a tag.
///
/// # Examples
///
/// ```
/// use jobcrawl::extract::to_plain_text;
///
/// assert_eq!(to_plain_text("<script>evil()</script>Hello &amp; World"), "Hello & World");
/// ```
#[must_use]
pub fn to_plain_text(markup: &str) -> String {
    if markup.is_empty() {
        return String::new();
    }

    let text = SCRIPT_RE.replace_all(markup, "");
    let text = STYLE_RE.replace_all(&text, "");
    let text = COMMENT_RE.replace_all(&text, "");
    let text = UNCLOSED_BLOCK_RE.replace_all(&text, "");
    let text = TAG_RE.replace_all(&text, " ");
    // Single pass, so "&amp;lt;" decodes to "&lt;" and not "<".
    let text = ENTITY_RE.replace_all(&text, |caps: &Captures<'_>| {
        decode_entity(&caps[0]).to_string()
    });
    let text = WHITESPACE_RE.replace_all(&text, " ");

    text.trim().to_string()
}

/// Like [`to_plain_text`], mapping a missing fragment to an empty string.
#[must_use]
pub fn to_plain_text_opt(markup: Option<&str>) -> String {
    markup.map(to_plain_text).unwrap_or_default()
}

/// Decodes encoded ampersands in an attribute-extracted URL.
#[must_use]
pub fn decode_url_ampersands(url: &str) -> String {
    url.replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_removed_before_text() {
        assert_eq!(
            to_plain_text("<script>evil()</script>Hello &amp; World"),
            "Hello & World"
        );
    }

    #[test]
    fn test_style_and_comments_do_not_leak() {
        let markup = r#"<style type="text/css">.a { color: red }</style>
            <!-- hidden <b>note</b> -->
            <p>Visible</p>"#;
        assert_eq!(to_plain_text(markup), "Visible");
    }

    #[test]
    fn test_multiline_script_with_attributes() {
        let markup = "<SCRIPT type=\"module\">\nlet x = '<p>';\n</SCRIPT>after";
        assert_eq!(to_plain_text(markup), "after");
    }

    #[test]
    fn test_unclosed_script_dropped_to_end() {
        assert_eq!(to_plain_text("<script>evil()"), "");
        assert_eq!(to_plain_text("Hi <script type=\"x\">evil()"), "Hi");
        assert_eq!(to_plain_text("Hi <style>.a{}"), "Hi");
        assert_eq!(to_plain_text("Hi <script"), "Hi");
        assert_eq!(
            to_plain_text("<script>a()</script>Keep<script>b()"),
            "Keep"
        );
        assert_eq!(to_plain_text("<!-- <script> -->Visible"), "Visible");
    }

    #[test]
    fn test_decode_entity_leaves_other_input_alone() {
        assert_eq!(decode_entity("&#39;"), "'");
        assert_eq!(decode_entity("&apos;"), "'");
        assert_eq!(decode_entity("&copy;"), "&copy;");
        assert_eq!(decode_entity("x"), "x");
    }

    #[test]
    fn test_encoded_markup_is_not_idempotent() {
        let once = to_plain_text("Use &lt;b&gt;bold&lt;/b&gt; text");
        assert_eq!(once, "Use <b>bold</b> text");
        assert_eq!(to_plain_text(&once), "Use bold text");
    }

    #[test]
    fn test_tags_become_spaces() {
        assert_eq!(to_plain_text("<b>Senior</b><i>Engineer</i>"), "Senior Engineer");
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(
            to_plain_text("a&nbsp;b &lt;c&gt; &quot;d&quot; it&#39;s we&apos;re"),
            "a b <c> \"d\" it's we're"
        );
    }

    #[test]
    fn test_unknown_entities_kept() {
        assert_eq!(to_plain_text("caf&eacute; &copy; 2024"), "caf&eacute; &copy; 2024");
    }

    #[test]
    fn test_double_encoded_ampersand_decodes_once() {
        assert_eq!(to_plain_text("R&amp;amp;D"), "R&amp;D");
    }

    #[test]
    fn test_whitespace_collapsed_and_trimmed() {
        assert_eq!(to_plain_text("  \n\t Berlin,\n   Germany  "), "Berlin, Germany");
    }

    #[test]
    fn test_empty_and_missing_input() {
        assert_eq!(to_plain_text(""), "");
        assert_eq!(to_plain_text_opt(None), "");
        assert_eq!(to_plain_text_opt(Some("<br/>")), "");
    }

    #[test]
    fn test_idempotent_on_realistic_markup() {
        let samples = [
            "<script>evil()</script>Hello &amp; World",
            "<h3 class=\"base-search-card__title\">\n  Rust   Engineer (Remote)\n</h3>",
            "<span>Berlin, Berlin, Germany</span><!-- x -->",
            "Tom &amp; Jerry&#39;s &nbsp; Bakery",
            "",
        ];
        for sample in samples {
            let once = to_plain_text(sample);
            assert_eq!(to_plain_text(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_decode_url_ampersands() {
        assert_eq!(
            decode_url_ampersands("https://x/jobs/view/1?a=1&amp;b=2"),
            "https://x/jobs/view/1?a=1&b=2"
        );
    }
}
