//! Crawl termination.
//!
//! This module provides:
//! - [`PageOutcome`]: one completed page as reported by a worker
//! - [`TerminationController`]: the single owner of crawl progress, deciding
//!   which records are emitted and when the crawl stops
//!
//! Pages complete out of order, so two empty pages are "consecutive" when
//! their offsets are one page apart, whichever of them arrives first.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::cancellation::CancellationToken;
use crate::config::{CrawlConfig, FetchFailurePolicy};
use crate::errors::FetchError;
use crate::models::JobRecord;

/// Result of fetching and extracting one page.
#[derive(Debug, Clone)]
pub enum PageResult {
    /// The page was fetched and extracted.
    Extracted {
        /// Records in document order.
        records: Vec<JobRecord>,
        /// Length of the fetched body in bytes.
        body_len: usize,
    },
    /// The fetch collaborator gave up on the page.
    Failed {
        /// The final fetch error.
        error: FetchError,
    },
}

/// One completed page.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    /// Item offset of the page.
    pub offset: usize,
    /// 1-based position of the page in the plan.
    pub page_index: usize,
    /// What happened.
    pub result: PageResult,
}

impl PageOutcome {
    /// Creates an outcome for an extracted page.
    #[must_use]
    pub fn extracted(page_index: usize, offset: usize, records: Vec<JobRecord>, body_len: usize) -> Self {
        Self {
            offset,
            page_index,
            result: PageResult::Extracted { records, body_len },
        }
    }

    /// Creates an outcome for a failed page.
    #[must_use]
    pub fn failed(page_index: usize, offset: usize, error: FetchError) -> Self {
        Self {
            offset,
            page_index,
            result: PageResult::Failed { error },
        }
    }
}

/// Why a crawl stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum StopReason {
    /// Two pages one page apart were both empty.
    ConsecutiveEmptyPages {
        /// Lower offset of the pair.
        first_offset: usize,
        /// Higher offset of the pair.
        second_offset: usize,
    },
    /// The record cap was reached.
    TargetReached {
        /// Records collected when the cap was hit.
        total: usize,
    },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConsecutiveEmptyPages {
                first_offset,
                second_offset,
            } => write!(
                f,
                "consecutive empty pages at offsets {first_offset} and {second_offset}"
            ),
            Self::TargetReached { total } => write!(f, "target reached with {total} records"),
        }
    }
}

/// Controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrawlStatus {
    /// Still accepting outcomes.
    Running,
    /// Terminal.
    Stopped(StopReason),
}

impl CrawlStatus {
    /// The stop reason, if stopped.
    #[must_use]
    pub fn stop_reason(&self) -> Option<StopReason> {
        match self {
            Self::Running => None,
            Self::Stopped(reason) => Some(*reason),
        }
    }
}

/// What the controller decided for one outcome.
#[derive(Debug, Clone)]
pub struct PageVerdict {
    /// Records to emit, in order.
    pub accepted: Vec<JobRecord>,
    /// Status after the outcome was applied.
    pub status: CrawlStatus,
    /// Whether this outcome caused the stop.
    pub newly_stopped: bool,
}

#[derive(Debug)]
struct CrawlState {
    total_collected: usize,
    empty_by_offset: HashMap<usize, bool>,
    target_cap: usize,
}

/// Decides which records are emitted and when a crawl stops.
///
/// Must be driven by a single task; outcomes may arrive in any order.
#[derive(Debug)]
pub struct TerminationController {
    state: CrawlState,
    status: CrawlStatus,
    page_size: usize,
    min_body_length: usize,
    failure_policy: FetchFailurePolicy,
    cancel_token: Arc<CancellationToken>,
}

impl TerminationController {
    /// Creates a controller with default body length and failure policy.
    #[must_use]
    pub fn new(target_cap: usize, page_size: usize, cancel_token: Arc<CancellationToken>) -> Self {
        let defaults = CrawlConfig::default();
        Self {
            state: CrawlState {
                total_collected: 0,
                empty_by_offset: HashMap::new(),
                target_cap,
            },
            status: CrawlStatus::Running,
            page_size,
            min_body_length: defaults.min_body_length,
            failure_policy: defaults.fetch_failure_policy,
            cancel_token,
        }
    }

    /// Creates a controller from a crawl configuration.
    #[must_use]
    pub fn from_config(config: &CrawlConfig, cancel_token: Arc<CancellationToken>) -> Self {
        Self::new(config.target_items, config.page_size, cancel_token)
            .with_min_body_length(config.min_body_length)
            .with_failure_policy(config.fetch_failure_policy)
    }

    /// Sets the minimal body length of a non-empty page.
    #[must_use]
    pub fn with_min_body_length(mut self, length: usize) -> Self {
        self.min_body_length = length;
        self
    }

    /// Sets the failed-page policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FetchFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> CrawlStatus {
        self.status
    }

    /// Whether the crawl has stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        matches!(self.status, CrawlStatus::Stopped(_))
    }

    /// Records accepted so far.
    #[must_use]
    pub fn total_collected(&self) -> usize {
        self.state.total_collected
    }

    /// Record cap.
    #[must_use]
    pub fn target_cap(&self) -> usize {
        self.state.target_cap
    }

    /// Applies one page outcome.
    pub fn observe(&mut self, outcome: PageOutcome) -> PageVerdict {
        if self.is_stopped() {
            return self.verdict(Vec::new(), false);
        }

        let PageOutcome {
            offset,
            page_index,
            result,
        } = outcome;

        match result {
            PageResult::Extracted { records, body_len } => {
                let found = records.len();
                let valid: Vec<JobRecord> =
                    records.into_iter().filter(JobRecord::is_valid).collect();
                if valid.is_empty() || body_len < self.min_body_length {
                    info!(page = page_index, offset, body_len, found, "Empty page");
                    self.record_empty(offset)
                } else {
                    self.accept(page_index, offset, found, valid)
                }
            }
            PageResult::Failed { .. } => match self.failure_policy {
                FetchFailurePolicy::Ignore => self.verdict(Vec::new(), false),
                FetchFailurePolicy::TreatAsEmpty => self.record_empty(offset),
            },
        }
    }

    fn record_empty(&mut self, offset: usize) -> PageVerdict {
        self.state.empty_by_offset.insert(offset, true);

        let below = offset
            .checked_sub(self.page_size)
            .filter(|prev| self.is_empty_at(*prev));
        let above = offset
            .checked_add(self.page_size)
            .filter(|next| self.is_empty_at(*next));

        let pair = match (below, above) {
            (Some(prev), _) => Some((prev, offset)),
            (None, Some(next)) => Some((offset, next)),
            (None, None) => None,
        };

        if let Some((first_offset, second_offset)) = pair {
            self.stop(StopReason::ConsecutiveEmptyPages {
                first_offset,
                second_offset,
            });
            return self.verdict(Vec::new(), true);
        }
        self.verdict(Vec::new(), false)
    }

    fn accept(
        &mut self,
        page_index: usize,
        offset: usize,
        found: usize,
        records: Vec<JobRecord>,
    ) -> PageVerdict {
        self.state.empty_by_offset.insert(offset, false);

        let room = self
            .state
            .target_cap
            .saturating_sub(self.state.total_collected);
        let accepted: Vec<JobRecord> = records.into_iter().take(room).collect();
        self.state.total_collected += accepted.len();

        info!(
            page = page_index,
            offset,
            jobs = found,
            total = self.state.total_collected,
            "Page {page_index} (start={offset}): found {found} jobs | total collected: {}",
            self.state.total_collected
        );

        if self.state.total_collected >= self.state.target_cap {
            self.stop(StopReason::TargetReached {
                total: self.state.total_collected,
            });
            return self.verdict(accepted, true);
        }
        self.verdict(accepted, false)
    }

    fn is_empty_at(&self, offset: usize) -> bool {
        self.state.empty_by_offset.get(&offset).copied().unwrap_or(false)
    }

    fn stop(&mut self, reason: StopReason) {
        info!(%reason, total = self.state.total_collected, "Stopping crawl");
        self.status = CrawlStatus::Stopped(reason);
        self.cancel_token.cancel(reason.to_string());
    }

    fn verdict(&self, accepted: Vec<JobRecord>, newly_stopped: bool) -> PageVerdict {
        PageVerdict {
            accepted,
            status: self.status,
            newly_stopped,
        }
    }
}
