//! # jobcrawl
//!
//! A paginated job-listing crawler.
//!
//! A crawl turns one job-search URL into a capped stream
//! of structured job records:
//!
//! - **Fetch planning**: the search URL becomes an ordered list of paginated
//!   listing requests
//! - **Record extraction**: listing markup is split into job cards and every
//!   field is read through ordered fallback strategies
//! - **Text sanitizing**: markup fragments become trimmed plain text
//! - **Termination**: pages completing out of order are tracked until the
//!   record cap is hit or two adjacent pages come back empty
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jobcrawl::prelude::*;
//! use std::sync::Arc;
//!
//! let fetcher = Arc::new(ReqwestPageFetcher::new(FetchConfig::default())?);
//! let sink = Arc::new(MemorySink::new());
//!
//! let crawler = Crawler::new(fetcher, sink.clone())
//!     .with_config(CrawlConfig::new().with_target_items(100));
//! let summary = crawler
//!     .run("https://www.linkedin.com/jobs/search?keywords=rust")
//!     .await?;
//!
//! println!("{} jobs", summary.total_collected);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod crawl;
pub mod errors;
pub mod events;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod plan;
pub mod sink;
pub mod termination;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{CrawlConfig, CrawlInput, FetchConfig, FetchFailurePolicy, RetryConfig};
    pub use crate::crawl::{CrawlSummary, Crawler};
    pub use crate::errors::{CrawlError, FetchError, InvalidInputError, SinkError};
    pub use crate::events::{CollectingEventSink, CrawlEventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::extract::{extract_page, to_plain_text, ListingExtractor, RecordExtractor};
    #[cfg(feature = "http")]
    pub use crate::fetch::ReqwestPageFetcher;
    pub use crate::fetch::PageFetcher;
    pub use crate::models::JobRecord;
    pub use crate::plan::{plan, FetchDescriptor, FetchPlanner};
    pub use crate::sink::{JsonLinesSink, LoggingSink, MemorySink, RecordSink};
    pub use crate::termination::{
        CrawlStatus, PageOutcome, PageResult, PageVerdict, StopReason, TerminationController,
    };
}
