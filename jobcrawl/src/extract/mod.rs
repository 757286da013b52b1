//! Job record extraction from listing markup.
//!
//! This module provides:
//! - Plain-text sanitizing of markup fragments
//! - Splitting a listing page into per-job fragments
//! - Ordered fallback strategies per field
//! - Apply URL synthesis from title and company slugs
//!
//! Extraction never fails. A field that cannot be read stays `None`, and a
//! fragment without a job identifier is dropped.

mod sanitize;
mod slug;
pub mod strategies;

pub use sanitize::{decode_url_ampersands, to_plain_text, to_plain_text_opt};
pub use slug::{slugify, COMPANY_SLUG_MAX, TITLE_SLUG_MAX};

use chrono::Utc;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::config::CrawlConfig;
use crate::models::JobRecord;
use strategies::{
    first_match, APPLY_URL, BENEFIT, COMPANY_BLOCK, HREF, JOB_ID, LOCATION, POSTED_DATE,
    POSTED_TIME, TITLE,
};

static ITEM_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<li\b[^>]*>").expect("valid regex"));

static ITEM_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</li\s*>").expect("valid regex"));

static JOB_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-entity-urn="urn:li:jobPosting:\d+""#).expect("valid regex")
});

/// Origin for relative and synthesized posting links.
pub const SITE_ORIGIN: &str = "https://www.linkedin.com";

/// Anything that turns one listing page into job records.
pub trait ListingExtractor: Send + Sync {
    /// Extracts every valid record from a page, in document order.
    fn extract_page(&self, markup: &str) -> Vec<JobRecord>;
}

/// Splits listing markup into job fragments.
///
/// A fragment runs from a list-item opening tag to the first closing tag after
/// it and is kept only if it carries a job-posting URN.
#[must_use]
pub fn split_fragments(markup: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut pos = 0;

    while let Some(open) = ITEM_OPEN_RE.find_at(markup, pos) {
        let Some(close) = ITEM_CLOSE_RE.find_at(markup, open.end()) else {
            break;
        };
        let fragment = &markup[open.start()..close.end()];
        if JOB_MARKER_RE.is_match(fragment) {
            fragments.push(fragment);
            pos = close.end();
        } else {
            pos = open.end();
        }
    }

    fragments
}

/// Maps listing markup into [`JobRecord`]s.
///
/// Stateless apart from its slug placeholders, so one instance can be
/// shared across workers.
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    title_placeholder: String,
    company_placeholder: String,
}

impl Default for RecordExtractor {
    fn default() -> Self {
        Self {
            title_placeholder: "job".to_string(),
            company_placeholder: "company".to_string(),
        }
    }
}

impl RecordExtractor {
    /// Creates an extractor with default placeholders.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an extractor using the placeholders from a crawl configuration.
    #[must_use]
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new().with_placeholders(&config.title_placeholder, &config.company_placeholder)
    }

    /// Sets the slug placeholders used when a title or company is missing.
    #[must_use]
    pub fn with_placeholders(mut self, title: impl Into<String>, company: impl Into<String>) -> Self {
        self.title_placeholder = title.into();
        self.company_placeholder = company.into();
        self
    }

    /// Extracts one record from a single fragment.
    ///
    /// Returns `None` when the fragment has no job identifier.
    #[must_use]
    pub fn extract_fragment(&self, fragment: &str) -> Option<JobRecord> {
        let id = JOB_ID.apply(fragment).filter(|id| !id.is_empty())?;
        let mut record = JobRecord::new_at(id, Utc::now());

        record.title = TITLE.apply(fragment).and_then(|raw| plain(&raw));
        if let Some(block) = COMPANY_BLOCK.apply(fragment) {
            record.company = plain(&block);
            record.company_url = HREF.apply(&block).map(|href| absolute_url(&href));
        }
        record.location = LOCATION.apply(fragment).and_then(|raw| plain(&raw));
        record.posted_date_iso = POSTED_DATE
            .apply(fragment)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty());
        record.posted_time_text = POSTED_TIME.apply(fragment).and_then(|raw| plain(&raw));

        record.apply_url = Some(match first_match(&APPLY_URL, fragment) {
            Some(hit) => {
                debug!(job_id = %record.id, strategy = hit.strategy, "Apply URL extracted");
                absolute_url(&hit.value)
            }
            None => self.synthesize_apply_url(
                record.title.as_deref(),
                record.company.as_deref(),
                &record.id,
            ),
        });

        record.benefits = BENEFIT
            .apply_all(fragment)
            .iter()
            .map(|raw| to_plain_text(raw))
            .collect();

        Some(record)
    }

    /// Builds a posting link from title and company slugs.
    #[must_use]
    pub fn synthesize_apply_url(&self, title: Option<&str>, company: Option<&str>, id: &str) -> String {
        let title_slug = slugify(title, TITLE_SLUG_MAX, &self.title_placeholder);
        let company_slug = slugify(company, COMPANY_SLUG_MAX, &self.company_placeholder);
        format!("{SITE_ORIGIN}/jobs/view/{title_slug}-at-{company_slug}-{id}")
    }
}

/// Resolves a possibly relative link against the site origin.
fn absolute_url(raw: &str) -> String {
    let decoded = decode_url_ampersands(raw.trim());
    if Url::parse(&decoded).is_ok() {
        return decoded;
    }
    Url::parse(SITE_ORIGIN)
        .and_then(|origin| origin.join(&decoded))
        .map(|url| url.to_string())
        .unwrap_or(decoded)
}

impl ListingExtractor for RecordExtractor {
    fn extract_page(&self, markup: &str) -> Vec<JobRecord> {
        let fragments = split_fragments(markup);
        let records: Vec<JobRecord> = fragments
            .iter()
            .filter_map(|fragment| self.extract_fragment(fragment))
            .collect();

        debug!(
            fragments = fragments.len(),
            records = records.len(),
            "Extracted listing page"
        );
        records
    }
}

/// Extracts records with a default [`RecordExtractor`].
#[must_use]
pub fn extract_page(markup: &str) -> Vec<JobRecord> {
    RecordExtractor::default().extract_page(markup)
}

fn plain(raw: &str) -> Option<String> {
    let text = to_plain_text(raw);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
