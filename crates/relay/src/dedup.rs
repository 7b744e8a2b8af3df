//! Decide whether a source detection is already at the destination.
//!
//! The destination cannot be queried by source id, so a detection counts as
//! present when some destination detection carries the same
//! `(feed_id, description, timestamp)` triple. The destination list is
//! newest-first and only the first page is fetched; a source detection
//! older than any destination entry walked is assumed to have been
//! forwarded already. Such a detection is never retried once an older
//! destination timestamp is observed.

use chrono::{DateTime, Utc};
use serde::Serialize;

use orca_core::DestinationDetection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceReason {
    /// Identical triple found.
    ExactMatch,
    /// Source is strictly older than a destination entry.
    OlderThanDestination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupVerdict {
    NotPresent,
    AlreadyPresent(PresenceReason),
}

impl DedupVerdict {
    pub fn is_present(&self) -> bool {
        matches!(self, DedupVerdict::AlreadyPresent(_))
    }
}

/// Walk `destination` (newest first) looking for `(feed_id, description, timestamp)`.
pub fn check_presence(
    feed_id: &str,
    timestamp: DateTime<Utc>,
    description: Option<&str>,
    destination: &[DestinationDetection],
) -> DedupVerdict {
    for candidate in destination {
        if candidate.timestamp != timestamp {
            if timestamp < candidate.timestamp {
                return DedupVerdict::AlreadyPresent(PresenceReason::OlderThanDestination);
            }
            continue;
        }
        if !candidate.is_complete() {
            continue;
        }
        if candidate.description.as_deref() != description {
            continue;
        }
        if candidate.feed_id.as_deref() != Some(feed_id) {
            continue;
        }
        return DedupVerdict::AlreadyPresent(PresenceReason::ExactMatch);
    }
    DedupVerdict::NotPresent
}
