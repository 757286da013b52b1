//! Scripted page fetcher.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::FetchError;
use crate::fetch::PageFetcher;
use crate::plan::FetchDescriptor;

/// Scripted response for one offset.
#[derive(Debug, Clone)]
pub struct ScriptedPage {
    /// Body or failure message.
    pub response: Result<String, String>,
    /// Time to wait before responding.
    pub delay: Duration,
}

/// A fetcher answering from a per-offset script.
///
/// Offsets without a script entry answer with an empty body.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    pages: HashMap<usize, ScriptedPage>,
    calls: Mutex<Vec<usize>>,
}

impl ScriptedFetcher {
    /// Creates an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `offset` with `body`.
    #[must_use]
    pub fn with_page(mut self, offset: usize, body: impl Into<String>) -> Self {
        self.entry(offset).response = Ok(body.into());
        self
    }

    /// Fails `offset` with `message`.
    #[must_use]
    pub fn with_failure(mut self, offset: usize, message: impl Into<String>) -> Self {
        self.entry(offset).response = Err(message.into());
        self
    }

    /// Delays the answer for `offset`.
    #[must_use]
    pub fn with_delay(mut self, offset: usize, delay: Duration) -> Self {
        self.entry(offset).delay = delay;
        self
    }

    /// Offsets in the order fetches started.
    #[must_use]
    pub fn fetched_offsets(&self) -> Vec<usize> {
        self.calls.lock().clone()
    }

    /// Number of fetches started.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    fn entry(&mut self, offset: usize) -> &mut ScriptedPage {
        self.pages.entry(offset).or_insert_with(|| ScriptedPage {
            response: Ok(String::new()),
            delay: Duration::ZERO,
        })
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, descriptor: &FetchDescriptor) -> Result<String, FetchError> {
        self.calls.lock().push(descriptor.offset);

        let Some(page) = self.pages.get(&descriptor.offset) else {
            return Ok(String::new());
        };
        if !page.delay.is_zero() {
            tokio::time::sleep(page.delay).await;
        }
        page.response
            .clone()
            .map_err(|message| FetchError::new(descriptor.url.clone(), message))
    }
}
