//! Crawl coordination.
//!
//! This module provides:
//! - [`Crawler`]: plans a search, runs fetch workers and feeds their page
//!   outcomes through the termination controller into a record sink
//! - [`CrawlSummary`]: what one run did
//!
//! Workers pull descriptors from a shared queue in plan order, fetch and
//! extract, and send outcomes over a channel. The coordinating task is the
//! only one touching the termination controller; once it stops, the shared
//! token makes workers drop their in-flight fetches and exit.


use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cancellation::{CancellationToken, WorkerGroup};
use crate::config::{CrawlConfig, CrawlInput};
use crate::errors::CrawlError;
use crate::events::{self, CrawlEventSink, NoOpEventSink};
use crate::extract::{ListingExtractor, RecordExtractor};
use crate::fetch::PageFetcher;
use crate::plan::{FetchDescriptor, FetchPlanner};
use crate::sink::RecordSink;
use crate::termination::{PageOutcome, PageResult, StopReason, TerminationController};

/// Result of one crawl run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSummary {
    /// Identifier tagging every event of the run.
    pub run_id: Uuid,
    /// Records accepted by the termination controller.
    pub total_collected: usize,
    /// Records the sink accepted.
    pub records_emitted: usize,
    /// Pages in the fetch plan.
    pub pages_planned: usize,
    /// Pages observed before the crawl stopped or the plan ran out.
    pub pages_observed: usize,
    /// Observed pages whose fetch failed.
    pub pages_failed: usize,
    /// Why the crawl stopped early, if it did.
    pub stop_reason: Option<StopReason>,
    /// Wall-clock duration of the run.
    pub elapsed_ms: u64,
}

impl CrawlSummary {
    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
            _ => HashMap::new(),
        }
    }
}

/// Runs crawls against a page fetcher and delivers records to a sink.
pub struct Crawler {
    config: CrawlConfig,
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<dyn RecordSink>,
    extractor: Arc<dyn ListingExtractor>,
    event_sink: Arc<dyn CrawlEventSink>,
}

impl Crawler {
    /// Creates a crawler with the default configuration.
    pub fn new(fetcher: Arc<dyn PageFetcher>, sink: Arc<dyn RecordSink>) -> Self {
        let config = CrawlConfig::default();
        Self {
            extractor: Arc::new(RecordExtractor::from_config(&config)),
            config,
            fetcher,
            sink,
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the configuration.
    ///
    /// Also resets the extractor to one using the configured placeholders.
    #[must_use]
    pub fn with_config(mut self, config: CrawlConfig) -> Self {
        self.extractor = Arc::new(RecordExtractor::from_config(&config));
        self.config = config;
        self
    }

    /// Replaces the extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn ListingExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, event_sink: Arc<dyn CrawlEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    /// The crawl configuration.
    #[must_use]
    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawls a search URL until the target is reached, two adjacent pages
    /// come back empty, or the plan runs out.
    ///
    /// # Errors
    ///
    /// Fails only before any fetch: on an invalid configuration or a search
    /// URL that cannot be planned. Fetch and sink failures are logged and the
    /// run completes with what was collected.
    pub async fn run(&self, search_url: &str) -> Result<CrawlSummary, CrawlError> {
        self.run_with_token(search_url, CancellationToken::shared())
            .await
    }

    /// Runs the crawl described by an input document on top of this
    /// crawler's configuration.
    ///
    /// # Errors
    ///
    /// See [`Crawler::run`].
    pub async fn run_input(&self, input: CrawlInput) -> Result<CrawlSummary, CrawlError> {
        let (search_url, config) = input.into_config(self.config.clone());
        self.execute(&config, &search_url, CancellationToken::shared())
            .await
    }

    /// Like [`Crawler::run`], with a caller-owned token that can end the
    /// crawl from outside.
    ///
    /// # Errors
    ///
    /// See [`Crawler::run`].
    pub async fn run_with_token(
        &self,
        search_url: &str,
        cancel_token: Arc<CancellationToken>,
    ) -> Result<CrawlSummary, CrawlError> {
        self.execute(&self.config, search_url, cancel_token).await
    }

    async fn execute(
        &self,
        config: &CrawlConfig,
        search_url: &str,
        cancel_token: Arc<CancellationToken>,
    ) -> Result<CrawlSummary, CrawlError> {
        config.validate()?;
        let plan = FetchPlanner::with_endpoint(config.listing_endpoint.as_str()).plan(
            search_url,
            config.target_items,
            config.page_size,
            config.max_pages,
        )?;

        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let pages_planned = plan.len();

        info!(
            %run_id,
            pages = pages_planned,
            target = config.target_items,
            concurrency = config.max_concurrency,
            "Starting crawl"
        );
        self.event_sink
            .emit(
                events::CRAWL_STARTED,
                Some(events::payload(
                    run_id,
                    json!({
                        "search_url": search_url,
                        "pages_planned": pages_planned,
                        "target_items": config.target_items,
                    }),
                )),
            )
            .await;

        let mut controller = TerminationController::from_config(config, cancel_token.clone());
        let group = WorkerGroup::with_token(cancel_token);
        let mut outcomes = self.spawn_workers(&group, plan, config.max_concurrency);

        let mut records_emitted = 0;
        let mut pages_observed = 0;
        let mut pages_failed = 0;

        while let Some(outcome) = outcomes.recv().await {
            if controller.is_stopped() {
                debug!(page = outcome.page_index, "Ignoring page after stop");
                continue;
            }
            pages_observed += 1;

            let (page_index, offset) = (outcome.page_index, outcome.offset);
            let found = match &outcome.result {
                PageResult::Extracted { records, .. } => Some(records.len()),
                PageResult::Failed { error } => {
                    pages_failed += 1;
                    warn!(page = page_index, offset, error = %error, "Page fetch failed");
                    self.event_sink
                        .emit(
                            events::PAGE_FAILED,
                            Some(events::payload(
                                run_id,
                                json!({ "page": page_index, "offset": offset, "error": error.to_dict() }),
                            )),
                        )
                        .await;
                    None
                }
            };

            let verdict = controller.observe(outcome);
            for record in &verdict.accepted {
                match self.sink.push(record).await {
                    Ok(()) => records_emitted += 1,
                    Err(error) => warn!(job_id = %record.id, error = %error, "Failed to push record"),
                }
            }

            if let Some(found) = found {
                self.event_sink
                    .emit(
                        events::PAGE_COMPLETED,
                        Some(events::payload(
                            run_id,
                            json!({
                                "page": page_index,
                                "offset": offset,
                                "jobs": found,
                                "accepted": verdict.accepted.len(),
                                "total": controller.total_collected(),
                            }),
                        )),
                    )
                    .await;
            }

            if verdict.newly_stopped {
                if let Some(reason) = verdict.status.stop_reason() {
                    self.event_sink
                        .emit(
                            events::CRAWL_STOPPED,
                            Some(events::payload(
                                run_id,
                                serde_json::to_value(reason).unwrap_or_default(),
                            )),
                        )
                        .await;
                }
            }
        }

        if let Err(error) = group.wait().await {
            warn!(%run_id, error = %error, "Crawl finished with worker failures");
        }

        let summary = CrawlSummary {
            run_id,
            total_collected: controller.total_collected(),
            records_emitted,
            pages_planned,
            pages_observed,
            pages_failed,
            stop_reason: controller.status().stop_reason(),
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        info!(
            %run_id,
            total = summary.total_collected,
            emitted = summary.records_emitted,
            pages = summary.pages_observed,
            failed = summary.pages_failed,
            elapsed_ms = summary.elapsed_ms,
            "Crawl completed"
        );
        self.event_sink
            .emit(
                events::CRAWL_COMPLETED,
                Some(events::payload(
                    run_id,
                    serde_json::to_value(&summary).unwrap_or_default(),
                )),
            )
            .await;

        Ok(summary)
    }

    fn spawn_workers(
        &self,
        group: &WorkerGroup,
        plan: Vec<FetchDescriptor>,
        concurrency: usize,
    ) -> mpsc::Receiver<PageOutcome> {
        let workers = concurrency.clamp(1, plan.len().max(1));
        let queue = Arc::new(Mutex::new(VecDeque::from(plan)));
        let (tx, rx) = mpsc::channel(workers * 2);

        for n in 0..workers {
            let queue = queue.clone();
            let tx = tx.clone();
            let fetcher = self.fetcher.clone();
            let extractor = self.extractor.clone();

            group.spawn(format!("fetch-worker-{n}"), move |token| async move {
                loop {
                    if token.is_cancelled() {
                        break;
                    }
                    let next = queue.lock().pop_front();
                    let Some(descriptor) = next else {
                        break;
                    };

                    let fetched = tokio::select! {
                        biased;
                        () = token.cancelled() => {
                            debug!(page = descriptor.page_index, "Abandoning in-flight fetch");
                            break;
                        }
                        fetched = fetcher.fetch(&descriptor) => fetched,
                    };

                    let result = match fetched {
                        Ok(body) => PageResult::Extracted {
                            records: extractor.extract_page(&body),
                            body_len: body.len(),
                        },
                        Err(error) => PageResult::Failed { error },
                    };
                    let outcome = PageOutcome {
                        offset: descriptor.offset,
                        page_index: descriptor.page_index,
                        result,
                    };
                    if tx.send(outcome).await.is_err() {
                        break;
                    }
                }
                Ok(())
            });
        }

        rx
    }
}

impl std::fmt::Debug for Crawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crawler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
