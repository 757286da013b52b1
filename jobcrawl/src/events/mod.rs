//! Crawl lifecycle events.
//!
//! This module provides:
//! - The [`CrawlEventSink`] trait and its no-op, logging and collecting sinks
//! - Event type names emitted by the crawler
//! - Payload construction tagged with the run id

mod sink;

pub use sink::{CollectingEventSink, CrawlEventSink, LoggingEventSink, NoOpEventSink};

use serde_json::{json, Map, Value};
use uuid::Uuid;

/// A crawl began.
pub const CRAWL_STARTED: &str = "crawl.started";
/// A page was observed by the termination controller.
pub const PAGE_COMPLETED: &str = "crawl.page_completed";
/// A page fetch failed.
pub const PAGE_FAILED: &str = "crawl.page_failed";
/// The termination controller stopped the crawl.
pub const CRAWL_STOPPED: &str = "crawl.stopped";
/// The crawl finished.
pub const CRAWL_COMPLETED: &str = "crawl.completed";

/// Builds an event payload carrying `run_id` and the fields of `data`.
///
/// `data` is merged in when it is a JSON object and stored under `"data"`
/// otherwise.
#[must_use]
pub fn payload(run_id: Uuid, data: Value) -> Value {
    let mut map = Map::new();
    map.insert("run_id".to_string(), json!(run_id.to_string()));
    match data {
        Value::Object(fields) => map.extend(fields),
        Value::Null => {}
        other => {
            map.insert("data".to_string(), other);
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_merges_object() {
        let run_id = Uuid::new_v4();
        let value = payload(run_id, json!({"page": 3, "offset": 50}));

        assert_eq!(value["run_id"], run_id.to_string());
        assert_eq!(value["page"], 3);
        assert_eq!(value["offset"], 50);
    }

    #[test]
    fn test_payload_wraps_scalars() {
        let run_id = Uuid::new_v4();
        assert_eq!(payload(run_id, json!(7))["data"], 7);
        assert!(payload(run_id, Value::Null).get("data").is_none());
    }
}
