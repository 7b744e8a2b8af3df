//! Compose and send the destination write for one detection.

use serde::Serialize;
use tracing::{info, warn};

use orca_core::{format_timestamp, SourceDetection};

use crate::error::SubmitError;
use crate::transport::{OutboundRequest, Transport};

/// JSON:API media type used for both `Content-Type` and `Accept`.
pub const JSON_API_MEDIA_TYPE: &str = "application/vnd.api+json";

#[derive(Debug, Serialize)]
struct DetectionDocument<'a> {
    data: DetectionResource<'a>,
}

#[derive(Debug, Serialize)]
struct DetectionResource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    attributes: DetectionAttributes<'a>,
}

// `source` is implied by the POST; `category` is not accepted by the API;
// playlist timestamp and player offset are derived server-side.
#[derive(Debug, Serialize)]
struct DetectionAttributes<'a> {
    description: Option<&'a str>,
    feed_id: &'a str,
    timestamp: String,
}

/// Successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub status: u16,
}

#[derive(Debug, Clone)]
pub struct DetectionSubmitter {
    url: String,
    api_key: Option<String>,
}

impl DetectionSubmitter {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into(),
            api_key,
        }
    }

    /// Build the authenticated write for `detection` under `feed_id`.
    pub fn compose(
        &self,
        feed_id: &str,
        detection: &SourceDetection,
    ) -> Result<OutboundRequest, SubmitError> {
        let document = DetectionDocument {
            data: DetectionResource {
                kind: "detection",
                attributes: DetectionAttributes {
                    description: detection.description(),
                    feed_id,
                    timestamp: format_timestamp(&detection.timestamp),
                },
            },
        };

        Ok(OutboundRequest {
            url: self.url.clone(),
            content_type: JSON_API_MEDIA_TYPE,
            accept: JSON_API_MEDIA_TYPE,
            bearer_token: self.api_key.clone(),
            body: serde_json::to_string(&document)?,
        })
    }

    /// Send one detection. Non-2xx responses come back as [`SubmitError::Rejected`].
    pub async fn submit(
        &self,
        transport: &dyn Transport,
        feed_id: &str,
        detection: &SourceDetection,
    ) -> Result<SubmitReceipt, SubmitError> {
        let request = self.compose(feed_id, detection)?;
        let response = transport.post(&request).await?;

        if !response.is_success() {
            warn!(
                source_id = %detection.id,
                feed_id,
                status = response.status,
                body = %response.body,
                "Destination rejected detection"
            );
            return Err(SubmitError::Rejected {
                status: response.status,
                body: response.body,
            });
        }

        info!(
            source_id = %detection.id,
            feed_id,
            timestamp = %format_timestamp(&detection.timestamp),
            "Detection posted successfully"
        );
        Ok(SubmitReceipt {
            status: response.status,
        })
    }
}
