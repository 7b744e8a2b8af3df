use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Stable identifier of a destination feed.
pub type FeedId = String;

/// A detection reported by the source service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDetection {
    pub id: String,
    /// Location name in the source service's naming scheme.
    pub location_name: String,
    pub timestamp: DateTime<Utc>,
    /// Free-text comments; forwarded as the destination description.
    pub comments: Option<String>,
}

impl SourceDetection {
    pub fn description(&self) -> Option<&str> {
        self.comments.as_deref()
    }
}

/// A named listening location known to the destination service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationFeed {
    pub id: FeedId,
    pub name: String,
}

/// A detection already posted to the destination service.
///
/// Only the timestamp is guaranteed. A record whose `feed_id` or
/// `description` was missing or mistyped is kept as incomplete: it still
/// bounds the newest-first walk by its timestamp but never matches exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationDetection {
    pub feed_id: Option<FeedId>,
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub complete: bool,
}

impl DestinationDetection {
    pub fn is_complete(&self) -> bool {
        self.complete && self.feed_id.is_some()
    }
}

/// Offset-less layouts accepted after RFC 3339 fails; interpreted as UTC.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a service timestamp into a UTC instant.
///
/// Accepts RFC 3339 with any offset, or an ISO-8601 date-time without an
/// offset (treated as UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DecodeError> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| DecodeError::Timestamp(raw.to_string()))
}

/// Render an instant the way the destination expects it: RFC 3339, `Z`
/// suffix, shortest sub-second precision that keeps the instant exact.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
