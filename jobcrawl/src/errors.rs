//! Error types for the crawler.
//!
//! Only planning can fail a run. Fetch and sink failures are reported per page
//! or per record and never abort a crawl; extraction never fails at all.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for crawl operations.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The search input could not be turned into a fetch plan.
    #[error("{0}")]
    InvalidInput(#[from] InvalidInputError),

    /// The crawl configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error raised when the search URL or plan parameters are unusable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid input '{input}': {reason}")]
pub struct InvalidInputError {
    /// The offending input.
    pub input: String,
    /// Why it was rejected.
    pub reason: String,
}

impl InvalidInputError {
    /// Creates a new invalid input error.
    #[must_use]
    pub fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// A page fetch failed.
///
/// Produced by fetch collaborators. The crawler reports it and applies the
/// configured failure policy; it is never fatal to a run.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("Fetch failed for {url}: {message}")]
pub struct FetchError {
    /// The requested URL.
    pub url: String,
    /// Failure description.
    pub message: String,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
}

impl FetchError {
    /// Creates a fetch error without a status code.
    #[must_use]
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Sets the HTTP status code.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("url".to_string(), serde_json::json!(self.url));
        map.insert("message".to_string(), serde_json::json!(self.message));
        if let Some(status) = self.status {
            map.insert("status".to_string(), serde_json::json!(status));
        }
        map
    }
}

/// A record could not be delivered to the output sink.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Sink error: {message}")]
pub struct SinkError {
    /// Failure description.
    pub message: String,
}

impl SinkError {
    /// Creates a new sink error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}
