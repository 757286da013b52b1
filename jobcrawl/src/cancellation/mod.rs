//! Cooperative cancellation for crawl workers.
//!
//! This module provides:
//! - CancellationToken shared between the termination controller and workers
//! - WorkerGroup for spawning and joining the fetch workers of one crawl

mod token;
mod worker_group;

pub use token::CancellationToken;
pub use worker_group::WorkerGroup;
