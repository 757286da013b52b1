//! Testing utilities for crawls.
//!
//! This module provides:
//! - Listing markup builders for job cards and pages
//! - A scripted page fetcher with per-offset bodies, failures and delays

mod fixtures;
mod mocks;

pub use fixtures::{job_page, page_html, JobCardBuilder};
pub use mocks::{ScriptedFetcher, ScriptedPage};
