//! One reconciliation pass: fetch, resolve, dedup, submit.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use orca_core::{format_timestamp, RelayConfig};

use crate::dedup::{check_presence, DedupVerdict, PresenceReason};
use crate::endpoints::Endpoints;
use crate::error::{ConfigError, CycleError, FetchStage, SubmitError};
use crate::fetch::{fetch_destination_detections, fetch_feeds, fetch_source_detections};
use crate::resolver::FeedResolver;
use crate::submit::DetectionSubmitter;
use crate::transport::Transport;

/// Where a cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    #[default]
    Idle,
    Fetching,
    Reconciling,
    Submitting,
}

/// Counts collected over one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub feeds: usize,
    pub feeds_malformed: usize,
    pub source_detections: usize,
    pub source_malformed: usize,
    pub destination_detections: usize,
    pub destination_malformed: usize,
    /// Kept for their timestamp only; never an exact match.
    pub destination_incomplete: usize,
    pub unresolved: usize,
    /// Exact `(feed_id, description, timestamp)` match at the destination.
    pub already_present: usize,
    /// Older than a destination entry, assumed forwarded earlier.
    pub superseded: usize,
    pub submitted: usize,
    pub rejected: usize,
    /// Submissions that never got a status back.
    pub failed: usize,
}

impl CycleReport {
    pub fn attempted(&self) -> usize {
        self.submitted + self.rejected + self.failed
    }
}

pub struct Reconciler {
    transport: Arc<dyn Transport>,
    endpoints: Endpoints,
    resolver: FeedResolver,
    submitter: DetectionSubmitter,
}

impl Reconciler {
    pub fn new(transport: Arc<dyn Transport>, config: &RelayConfig) -> Result<Self, ConfigError> {
        let endpoints = Endpoints::from_config(config)?;
        let submitter = DetectionSubmitter::new(
            endpoints.post_detection.clone(),
            config.destination.api_key.clone(),
        );
        Ok(Self {
            transport,
            endpoints,
            resolver: FeedResolver::default(),
            submitter,
        })
    }

    pub fn with_resolver(mut self, resolver: FeedResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let mut ignore = |_: CyclePhase| {};
        self.run_cycle_observed(&mut ignore).await
    }

    /// Run one cycle, reporting each phase change to `observe`.
    ///
    /// Any fetch failure aborts before the first submission. Everything
    /// after that is contained to the detection it concerns.
    pub async fn run_cycle_observed(
        &self,
        observe: &mut (dyn FnMut(CyclePhase) + Send),
    ) -> Result<CycleReport, CycleError> {
        let transport = self.transport.as_ref();
        let mut report = CycleReport::default();

        observe(CyclePhase::Fetching);

        let feeds = fetch_feeds(transport, &self.endpoints.feeds)
            .await
            .map_err(|e| CycleError::fetch(FetchStage::Feeds, e))?;
        report.feeds = feeds.records.len();
        report.feeds_malformed = feeds.rejected.len();

        let source = fetch_source_detections(transport, &self.endpoints.source_detections)
            .await
            .map_err(|e| CycleError::fetch(FetchStage::SourceDetections, e))?;
        report.source_detections = source.records.len();
        report.source_malformed = source.rejected.len();

        let destination =
            fetch_destination_detections(transport, &self.endpoints.destination_detections)
                .await
                .map_err(|e| CycleError::fetch(FetchStage::DestinationDetections, e))?;
        report.destination_detections = destination.records.len();
        report.destination_malformed = destination.rejected.len();
        report.destination_incomplete = destination
            .records
            .iter()
            .filter(|d| !d.is_complete())
            .count();

        let feeds = feeds.records;
        let destination = destination.records;

        // Served newest first; forward oldest first.
        for detection in source.records.iter().rev() {
            observe(CyclePhase::Reconciling);

            let feed = match self.resolver.resolve(&detection.location_name, &feeds) {
                Ok(feed) => feed,
                Err(e) => {
                    warn!(source_id = %detection.id, error = %e, "Skipping detection");
                    report.unresolved += 1;
                    continue;
                }
            };

            let verdict = check_presence(
                &feed.id,
                detection.timestamp,
                detection.description(),
                &destination,
            );
            match verdict {
                DedupVerdict::AlreadyPresent(PresenceReason::ExactMatch) => {
                    debug!(source_id = %detection.id, feed_id = %feed.id, "Already at destination");
                    report.already_present += 1;
                    continue;
                }
                DedupVerdict::AlreadyPresent(PresenceReason::OlderThanDestination) => {
                    debug!(
                        source_id = %detection.id,
                        timestamp = %format_timestamp(&detection.timestamp),
                        "Older than newest destination detection"
                    );
                    report.superseded += 1;
                    continue;
                }
                DedupVerdict::NotPresent => {}
            }

            observe(CyclePhase::Submitting);
            match self.submitter.submit(transport, &feed.id, detection).await {
                Ok(_) => report.submitted += 1,
                Err(SubmitError::Rejected { .. }) => report.rejected += 1,
                Err(e) => {
                    warn!(source_id = %detection.id, feed_id = %feed.id, error = %e, "Submission failed");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}
