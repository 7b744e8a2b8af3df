//! The three required reads of a cycle.

use tracing::{debug, warn};

use orca_core::{DestinationDetection, DestinationFeed, SourceDetection};

use crate::decode::{
    decode_destination_detections, decode_feeds, decode_source_detections, Decoded,
};
use crate::error::FetchError;
use crate::transport::Transport;

async fn get_body(transport: &dyn Transport, url: &str) -> Result<String, FetchError> {
    let response = transport.get(url).await?;
    if !response.is_success() {
        warn!(url, status = response.status, "Fetch returned non-success status");
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status,
            body: response.body,
        });
    }
    debug!(url, bytes = response.body.len(), "Fetched");
    Ok(response.body)
}

pub async fn fetch_feeds(
    transport: &dyn Transport,
    url: &str,
) -> Result<Decoded<DestinationFeed>, FetchError> {
    let body = get_body(transport, url).await?;
    Ok(decode_feeds(&body)?)
}

/// Source detections, newest first as served.
pub async fn fetch_source_detections(
    transport: &dyn Transport,
    url: &str,
) -> Result<Decoded<SourceDetection>, FetchError> {
    let body = get_body(transport, url).await?;
    Ok(decode_source_detections(&body)?)
}

pub async fn fetch_destination_detections(
    transport: &dyn Transport,
    url: &str,
) -> Result<Decoded<DestinationDetection>, FetchError> {
    let body = get_body(transport, url).await?;
    Ok(decode_destination_detections(&body)?)
}
