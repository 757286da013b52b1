//! Named, ordered extraction strategies.
//!
//! Each field is read by a chain of strategies tried in order; the first
//! strategy that matches wins. A strategy is a regex plus the capture group
//! holding the value.

use regex::Regex;
use std::sync::LazyLock;

/// A single named way of reading a value out of a fragment.
#[derive(Debug, Clone)]
pub struct ExtractionStrategy {
    name: &'static str,
    pattern: Regex,
    group: usize,
}

/// The value a strategy produced, tagged with the strategy's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyMatch {
    /// Name of the strategy that matched.
    pub strategy: &'static str,
    /// Captured raw value.
    pub value: String,
}

impl ExtractionStrategy {
    /// Compiles a strategy. Panics on an invalid pattern; patterns are static.
    #[must_use]
    pub fn new(name: &'static str, pattern: &str, group: usize) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("valid strategy pattern"),
            group,
        }
    }

    /// Strategy name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Applies the strategy to a fragment.
    #[must_use]
    pub fn apply(&self, fragment: &str) -> Option<String> {
        self.pattern
            .captures(fragment)
            .and_then(|caps| caps.get(self.group))
            .map(|m| m.as_str().to_string())
    }

    /// Every match of the strategy, in document order.
    #[must_use]
    pub fn apply_all(&self, fragment: &str) -> Vec<String> {
        self.pattern
            .captures_iter(fragment)
            .filter_map(|caps| caps.get(self.group))
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

/// Runs strategies in order and returns the first match.
#[must_use]
pub fn first_match(strategies: &[ExtractionStrategy], fragment: &str) -> Option<StrategyMatch> {
    strategies.iter().find_map(|strategy| {
        strategy.apply(fragment).map(|value| StrategyMatch {
            strategy: strategy.name(),
            value,
        })
    })
}

/// Job posting identifier from the entity URN.
pub static JOB_ID: LazyLock<ExtractionStrategy> = LazyLock::new(|| {
    ExtractionStrategy::new("entity_urn", r#"data-entity-urn="urn:li:jobPosting:(\d+)""#, 1)
});

/// Card title heading.
pub static TITLE: LazyLock<ExtractionStrategy> = LazyLock::new(|| {
    ExtractionStrategy::new(
        "card_title",
        r#"(?is)<h3[^>]*class="[^"]*\bbase-search-card__title\b[^"]*"[^>]*>(.*?)</h3>"#,
        1,
    )
});

/// Card subtitle holding the company name and link.
pub static COMPANY_BLOCK: LazyLock<ExtractionStrategy> = LazyLock::new(|| {
    ExtractionStrategy::new(
        "card_subtitle",
        r#"(?is)<h4[^>]*class="[^"]*\bbase-search-card__subtitle\b[^"]*"[^>]*>(.*?)</h4>"#,
        1,
    )
});

/// First `href` attribute value.
pub static HREF: LazyLock<ExtractionStrategy> =
    LazyLock::new(|| ExtractionStrategy::new("href", r#"href="([^"]+)""#, 1));

/// Card location span.
pub static LOCATION: LazyLock<ExtractionStrategy> = LazyLock::new(|| {
    ExtractionStrategy::new(
        "card_location",
        r#"(?is)<span[^>]*class="[^"]*\bjob-search-card__location\b[^"]*"[^>]*>(.*?)</span>"#,
        1,
    )
});

/// `datetime` attribute of the first `<time>` element.
pub static POSTED_DATE: LazyLock<ExtractionStrategy> = LazyLock::new(|| {
    ExtractionStrategy::new(
        "time_datetime",
        r#"(?is)<time[^>]*datetime="([^"]*)"[^>]*>.*?</time>"#,
        1,
    )
});

/// Text of the first `<time>` element carrying a `datetime` attribute.
pub static POSTED_TIME: LazyLock<ExtractionStrategy> = LazyLock::new(|| {
    ExtractionStrategy::new(
        "time_text",
        r#"(?is)<time[^>]*datetime="[^"]*"[^>]*>(.*?)</time>"#,
        1,
    )
});

/// Benefit badges.
pub static BENEFIT: LazyLock<ExtractionStrategy> = LazyLock::new(|| {
    ExtractionStrategy::new(
        "benefit_text",
        r#"(?is)<span[^>]*class="[^"]*\bjob-posting-benefits__text\b[^"]*"[^>]*>(.*?)</span>"#,
        1,
    )
});

/// Apply URL strategies, in priority order.
pub static APPLY_URL: LazyLock<Vec<ExtractionStrategy>> = LazyLock::new(|| {
    vec![
        ExtractionStrategy::new(
            "full_card_link",
            r#"(?is)<a[^>]*class="[^"]*base-card__full-link[^"]*"[^>]*href="([^"]+)""#,
            1,
        ),
        ExtractionStrategy::new(
            "view_posting_anchor",
            r#"(?is)<a[^>]*href="([^"]*/jobs/view/[^"]+)""#,
            1,
        ),
        ExtractionStrategy::new(
            "view_posting_literal",
            r#"https?://[^\s"]*linkedin\.com/jobs/view/[^\s"]+"#,
            0,
        ),
    ]
});
