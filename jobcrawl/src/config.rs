//! Configuration types for crawling and fetching.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::errors::CrawlError;
use crate::plan::DEFAULT_LISTING_ENDPOINT;

/// What the termination controller does with a page whose fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFailurePolicy {
    /// Leave the page unrecorded; the fetch collaborator owns retries.
    #[default]
    Ignore,
    /// Record the page as empty for the consecutive-empty-pages check.
    TreatAsEmpty,
}

/// Configuration of one crawl.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrawlConfig {
    /// Number of records to collect before stopping.
    #[serde(default = "default_target_items")]
    pub target_items: usize,
    /// Items per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Upper bound on planned pages.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    /// Bodies shorter than this count as empty pages.
    #[serde(default = "default_min_body_length")]
    pub min_body_length: usize,
    /// Concurrent page fetches.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Title slug used when a posting has no title.
    #[serde(default = "default_title_placeholder")]
    pub title_placeholder: String,
    /// Company slug used when a posting has no company.
    #[serde(default = "default_company_placeholder")]
    pub company_placeholder: String,
    /// Paginated listing endpoint search URLs are rewritten to.
    #[serde(default = "default_listing_endpoint")]
    pub listing_endpoint: String,
    /// Handling of failed page fetches.
    #[serde(default)]
    pub fetch_failure_policy: FetchFailurePolicy,
}

fn default_target_items() -> usize {
    1000
}

fn default_page_size() -> usize {
    25
}

fn default_max_pages() -> usize {
    40
}

fn default_min_body_length() -> usize {
    100
}

fn default_max_concurrency() -> usize {
    3
}

fn default_title_placeholder() -> String {
    "job".to_string()
}

fn default_company_placeholder() -> String {
    "company".to_string()
}

fn default_listing_endpoint() -> String {
    DEFAULT_LISTING_ENDPOINT.to_string()
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            target_items: default_target_items(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            min_body_length: default_min_body_length(),
            max_concurrency: default_max_concurrency(),
            title_placeholder: default_title_placeholder(),
            company_placeholder: default_company_placeholder(),
            listing_endpoint: default_listing_endpoint(),
            fetch_failure_policy: FetchFailurePolicy::default(),
        }
    }
}

impl CrawlConfig {
    /// Creates a new crawl configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target record count.
    #[must_use]
    pub fn with_target_items(mut self, target: usize) -> Self {
        self.target_items = target;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the page cap.
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Sets the minimal valid body length.
    #[must_use]
    pub fn with_min_body_length(mut self, length: usize) -> Self {
        self.min_body_length = length;
        self
    }

    /// Sets the number of concurrent fetches.
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// Sets the slug placeholders.
    #[must_use]
    pub fn with_placeholders(mut self, title: impl Into<String>, company: impl Into<String>) -> Self {
        self.title_placeholder = title.into();
        self.company_placeholder = company.into();
        self
    }

    /// Sets the listing endpoint.
    #[must_use]
    pub fn with_listing_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.listing_endpoint = endpoint.into();
        self
    }

    /// Sets the fetch failure policy.
    #[must_use]
    pub fn with_fetch_failure_policy(mut self, policy: FetchFailurePolicy) -> Self {
        self.fetch_failure_policy = policy;
        self
    }

    /// Checks that the configuration can drive a crawl.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.target_items == 0 {
            return Err(CrawlError::Config("target_items must be positive".to_string()));
        }
        if self.page_size == 0 {
            return Err(CrawlError::Config("page_size must be positive".to_string()));
        }
        if self.max_pages == 0 {
            return Err(CrawlError::Config("max_pages must be positive".to_string()));
        }
        if self.max_concurrency == 0 {
            return Err(CrawlError::Config("max_concurrency must be positive".to_string()));
        }
        if self.title_placeholder.is_empty() || self.company_placeholder.is_empty() {
            return Err(CrawlError::Config("slug placeholders must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Input document of a crawl run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CrawlInput {
    /// Search URL to crawl.
    pub linkedin_url: String,
    /// Number of records to collect.
    #[serde(default = "default_target_items")]
    pub max_items: usize,
}

impl CrawlInput {
    /// Parses an input document.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Serialization`] for malformed JSON or missing
    /// fields.
    pub fn from_json(json: &str) -> Result<Self, CrawlError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Applies the input on top of a base configuration.
    #[must_use]
    pub fn into_config(self, base: CrawlConfig) -> (String, CrawlConfig) {
        let config = base.with_target_items(self.max_items);
        (self.linkedin_url, config)
    }
}

/// Configuration for the HTTP page fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: f64,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Additional headers to include.
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,
    /// Retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_timeout() -> f64 {
    30.0
}

fn default_user_agent() -> String {
    concat!("jobcrawl/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
            headers: std::collections::HashMap::new(),
            retry: RetryConfig::default(),
        }
    }
}

impl FetchConfig {
    /// Creates a new fetch configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, seconds: f64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Sets the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Gets timeout as Duration.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Config`] when the timeout is not a positive,
    /// finite number of seconds.
    pub fn timeout(&self) -> Result<Duration, CrawlError> {
        match Duration::try_from_secs_f64(self.timeout_seconds) {
            Ok(timeout) if !timeout.is_zero() => Ok(timeout),
            _ => Err(CrawlError::Config(format!(
                "timeout_seconds must be positive and finite, got {}",
                self.timeout_seconds
            ))),
        }
    }

    /// Checks that the configuration can build an HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), CrawlError> {
        self.timeout()?;
        self.retry.validate()
    }
}

/// Retry configuration for failed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Initial delay between retries in seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_seconds: f64,
    /// Backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Maximum delay between retries.
    #[serde(default = "default_max_delay")]
    pub max_delay_seconds: f64,
    /// Status codes that should trigger a retry.
    #[serde(default = "default_retry_status_codes")]
    pub retry_status_codes: HashSet<u16>,
    /// Whether to add up to 25% random jitter to each delay.
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

fn default_max_retries() -> usize {
    2
}

fn default_retry_delay() -> f64 {
    1.0
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_delay() -> f64 {
    30.0
}

fn default_retry_status_codes() -> HashSet<u16> {
    [429, 500, 502, 503, 504].into_iter().collect()
}

fn default_jitter() -> bool {
    true
}

// NaN and negative values become zero, overflow saturates.
fn seconds_to_duration(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_seconds: default_retry_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_seconds: default_max_delay(),
            retry_status_codes: default_retry_status_codes(),
            jitter: default_jitter(),
        }
    }
}

impl RetryConfig {
    /// Checks that the delay settings are usable.
    ///
    /// An infinite `max_delay_seconds` is allowed and means uncapped.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Config`] for negative or NaN delays and
    /// multipliers.
    pub fn validate(&self) -> Result<(), CrawlError> {
        let fields = [
            ("retry_delay_seconds", self.retry_delay_seconds),
            ("backoff_multiplier", self.backoff_multiplier),
            ("max_delay_seconds", self.max_delay_seconds),
        ];
        for (name, value) in fields {
            if value.is_nan() || value < 0.0 {
                return Err(CrawlError::Config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Calculates the delay for a given attempt.
    ///
    /// Delays too large for a [`Duration`] saturate at [`Duration::MAX`].
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay = self.retry_delay_seconds * self.backoff_multiplier.powi(exponent);
        seconds_to_duration(delay.min(self.max_delay_seconds))
    }

    /// Delay for a given attempt with jitter applied when enabled.
    #[must_use]
    pub fn jittered_delay(&self, attempt: usize) -> Duration {
        let base = self.delay_for_attempt(attempt);
        if self.jitter {
            seconds_to_duration(base.as_secs_f64() * (1.0 + 0.25 * rand::random::<f64>()))
        } else {
            base
        }
    }

    /// Whether a status code should trigger a retry.
    #[must_use]
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_config_defaults() {
        let config = CrawlConfig::default();
        assert_eq!(config.target_items, 1000);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.max_pages, 40);
        assert_eq!(config.min_body_length, 100);
        assert_eq!(config.max_concurrency, 3);
        assert_eq!(config.title_placeholder, "job");
        assert_eq!(config.company_placeholder, "company");
        assert_eq!(config.fetch_failure_policy, FetchFailurePolicy::Ignore);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_crawl_config_builder() {
        let config = CrawlConfig::new()
            .with_target_items(60)
            .with_max_concurrency(1)
            .with_placeholders("posting", "employer")
            .with_fetch_failure_policy(FetchFailurePolicy::TreatAsEmpty);

        assert_eq!(config.target_items, 60);
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.title_placeholder, "posting");
        assert_eq!(config.fetch_failure_policy, FetchFailurePolicy::TreatAsEmpty);
    }

    #[test]
    fn test_crawl_config_from_partial_json() {
        let config: CrawlConfig =
            serde_json::from_str(r#"{"target_items": 50, "fetch_failure_policy": "treat_as_empty"}"#)
                .unwrap();
        assert_eq!(config.target_items, 50);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.fetch_failure_policy, FetchFailurePolicy::TreatAsEmpty);
    }

    #[test]
    fn test_validate_rejects_zeroes() {
        assert!(CrawlConfig::new().with_target_items(0).validate().is_err());
        assert!(CrawlConfig::new().with_page_size(0).validate().is_err());
        assert!(CrawlConfig::new().with_max_pages(0).validate().is_err());
        assert!(CrawlConfig::new().with_max_concurrency(0).validate().is_err());
        assert!(CrawlConfig::new().with_placeholders("", "x").validate().is_err());
    }

    #[test]
    fn test_crawl_input_defaults_max_items() {
        let input =
            CrawlInput::from_json(r#"{"linkedinUrl": "https://www.linkedin.com/jobs/search?keywords=rust"}"#)
                .unwrap();
        assert_eq!(input.max_items, 1000);

        let (url, config) = input.into_config(CrawlConfig::default());
        assert!(url.contains("keywords=rust"));
        assert_eq!(config.target_items, 1000);
    }

    #[test]
    fn test_crawl_input_requires_url() {
        assert!(CrawlInput::from_json(r#"{"maxItems": 10}"#).is_err());
        assert!(CrawlInput::from_json("not json").is_err());
    }

    #[test]
    fn test_fetch_config_builder() {
        let config = FetchConfig::new()
            .with_timeout(10.0)
            .with_user_agent("custom-agent")
            .with_header("Accept-Language", "en-US");

        assert_eq!(config.timeout().unwrap(), Duration::from_secs(10));
        assert_eq!(config.user_agent, "custom-agent");
        assert_eq!(config.headers.get("Accept-Language"), Some(&"en-US".to_string()));
    }

    #[test]
    fn test_retry_config_delay() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
    }

    #[test]
    fn test_retry_config_max_delay() {
        let config = RetryConfig {
            max_delay_seconds: 5.0,
            ..Default::default()
        };
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(5));
    }

    #[test]
    fn test_jittered_delay_bounds() {
        let config = RetryConfig::default();
        for _ in 0..20 {
            let delay = config.jittered_delay(1);
            assert!(delay >= Duration::from_secs(2));
            assert!(delay <= Duration::from_millis(2500));
        }

        let fixed = RetryConfig {
            jitter: false,
            ..Default::default()
        };
        assert_eq!(fixed.jittered_delay(1), Duration::from_secs(2));
    }

    #[test]
    fn test_fetch_config_rejects_bad_timeouts() {
        for seconds in [-1.0, 0.0, f64::NAN, f64::INFINITY, 1e300] {
            let config = FetchConfig::new().with_timeout(seconds);
            assert!(matches!(config.timeout(), Err(CrawlError::Config(_))));
            assert!(config.validate().is_err());
        }
        assert!(FetchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_retry_config_rejects_negative_or_nan() {
        let negative = RetryConfig {
            retry_delay_seconds: -1.0,
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let nan = RetryConfig {
            backoff_multiplier: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());
        assert!(FetchConfig::new().with_retry(nan).validate().is_err());
    }

    #[test]
    fn test_uncapped_delay_saturates() {
        let config = RetryConfig {
            max_delay_seconds: f64::INFINITY,
            backoff_multiplier: 1e10,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.delay_for_attempt(100), Duration::MAX);
        assert_eq!(config.jittered_delay(100), Duration::MAX);
    }

    #[test]
    fn test_retry_status_codes() {
        let config = RetryConfig::default();
        assert!(config.should_retry_status(429));
        assert!(config.should_retry_status(503));
        assert!(!config.should_retry_status(200));
        assert!(!config.should_retry_status(404));
    }
}
