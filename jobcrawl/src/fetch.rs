//! Page fetching.
//!
//! The crawler only sees the [`PageFetcher`] trait. Retries, timeouts and
//! transport concerns belong to the implementation; a fetcher returns the
//! final outcome of a page after its own retries are exhausted.

use async_trait::async_trait;

use crate::errors::FetchError;
use crate::plan::FetchDescriptor;

/// Retrieves the markup of one planned page.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the page body.
    async fn fetch(&self, descriptor: &FetchDescriptor) -> Result<String, FetchError>;
}

#[cfg(feature = "http")]
pub use http::ReqwestPageFetcher;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;
    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
    use tracing::{debug, warn};

    use super::PageFetcher;
    use crate::config::FetchConfig;
    use crate::errors::{CrawlError, FetchError};
    use crate::plan::FetchDescriptor;

    /// HTTP fetcher backed by `reqwest`, retrying transport errors and
    /// retryable status codes with exponential backoff.
    #[derive(Debug, Clone)]
    pub struct ReqwestPageFetcher {
        client: reqwest::Client,
        config: FetchConfig,
    }

    enum Attempt {
        Retryable(FetchError),
        Fatal(FetchError),
    }

    impl ReqwestPageFetcher {
        /// Creates a fetcher from its configuration.
        ///
        /// # Errors
        ///
        /// Returns [`CrawlError::Config`] for an invalid timeout or retry
        /// setting, invalid headers, or when the HTTP client cannot be built.
        pub fn new(config: FetchConfig) -> Result<Self, CrawlError> {
            config.validate()?;
            let mut headers = HeaderMap::new();
            for (key, value) in &config.headers {
                let name = HeaderName::from_bytes(key.as_bytes())
                    .map_err(|e| CrawlError::Config(format!("invalid header name '{key}': {e}")))?;
                let value = HeaderValue::from_str(value)
                    .map_err(|e| CrawlError::Config(format!("invalid value for header '{key}': {e}")))?;
                headers.insert(name, value);
            }

            let client = reqwest::Client::builder()
                .timeout(config.timeout()?)
                .user_agent(config.user_agent.as_str())
                .default_headers(headers)
                .build()
                .map_err(|e| CrawlError::Config(format!("failed to build HTTP client: {e}")))?;

            Ok(Self { client, config })
        }

        /// The fetch configuration.
        #[must_use]
        pub fn config(&self) -> &FetchConfig {
            &self.config
        }

        async fn attempt(&self, url: &str) -> Result<String, Attempt> {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| Attempt::Retryable(FetchError::new(url, e.to_string())))?;

            let status = response.status();
            if !status.is_success() {
                let error = FetchError::new(url, format!("unexpected status {status}"))
                    .with_status(status.as_u16());
                return Err(if self.config.retry.should_retry_status(status.as_u16()) {
                    Attempt::Retryable(error)
                } else {
                    Attempt::Fatal(error)
                });
            }

            response
                .text()
                .await
                .map_err(|e| Attempt::Retryable(FetchError::new(url, e.to_string())))
        }
    }

    #[async_trait]
    impl PageFetcher for ReqwestPageFetcher {
        async fn fetch(&self, descriptor: &FetchDescriptor) -> Result<String, FetchError> {
            let retry = &self.config.retry;
            let mut attempt = 0;

            loop {
                match self.attempt(&descriptor.url).await {
                    Ok(body) => {
                        debug!(
                            page = descriptor.page_index,
                            bytes = body.len(),
                            attempt,
                            "Fetched page"
                        );
                        return Ok(body);
                    }
                    Err(Attempt::Fatal(error)) => return Err(error),
                    Err(Attempt::Retryable(error)) if attempt >= retry.max_retries => return Err(error),
                    Err(Attempt::Retryable(error)) => {
                        let delay = retry.jittered_delay(attempt);
                        warn!(
                            page = descriptor.page_index,
                            attempt = attempt + 1,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            error = %error,
                            "Retrying page fetch"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                }
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_fetcher_through_trait_object() {
        let mut mock = MockPageFetcher::new();
        mock.expect_fetch()
            .withf(|d| d.offset == 25)
            .returning(|d| Err(FetchError::new(d.url.clone(), "boom").with_status(503)));

        let fetcher: Box<dyn PageFetcher> = Box::new(mock);
        let descriptor = FetchDescriptor {
            page_index: 2,
            offset: 25,
            url: "https://x/listing?start=25".to_string(),
        };
        let error = fetcher.fetch(&descriptor).await.unwrap_err();
        assert_eq!(error.status, Some(503));
    }
}
