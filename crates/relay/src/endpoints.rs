//! Request URLs for both services, built once from configuration.

use url::Url;

use orca_core::RelayConfig;

use crate::error::ConfigError;

/// Feed attributes requested from the destination.
const FEED_FIELDS: &str = "id,name,node_name,slug,location_point,intro_html,image_url,visible,\
bucket,bucket_region,cloudfront_url,dataplicity_id,orcahello_id";

/// Detection attributes requested from the destination.
const DETECTION_FIELDS: &str = "id,source_ip,playlist_timestamp,player_offset,listener_count,\
timestamp,description,visible,source,category,candidate_id,feed_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub source_detections: String,
    pub feeds: String,
    pub destination_detections: String,
    pub post_detection: String,
}

impl Endpoints {
    pub fn from_config(config: &RelayConfig) -> Result<Self, ConfigError> {
        let source = &config.source;
        let destination_base = format!("https://{}", config.destination.hostname);
        let detection_limit = config.destination.detection_limit.to_string();
        let max_count = source.max_detection_count.to_string();

        let source_detections = build(
            &format!("{}/api/detections", source.base_url),
            &[
                ("Page", "1"),
                ("SortBy", "timestamp"),
                ("SortOrder", "desc"),
                ("Timeframe", source.timeframe.as_str()),
                ("Location", source.location.as_str()),
                ("RecordsPerPage", max_count.as_str()),
            ],
        )?;

        let feeds = build(
            &format!("{destination_base}/api/json/feeds"),
            &[("fields[feed]", FEED_FIELDS)],
        )?;

        // Only machine-sourced whale detections, newest first.
        let destination_detections = build(
            &format!("{destination_base}/api/json/detections"),
            &[
                ("sort", "-timestamp"),
                ("filter[category]", "whale"),
                ("filter[source]", "machine"),
                ("page[limit]", detection_limit.as_str()),
                ("fields[detection]", DETECTION_FIELDS),
            ],
        )?;

        let post_detection = build(
            &format!("{destination_base}/api/json/detections"),
            &[("fields[detection]", DETECTION_FIELDS)],
        )?;

        Ok(Self {
            source_detections,
            feeds,
            destination_detections,
            post_detection,
        })
    }
}

fn build(base: &str, params: &[(&str, &str)]) -> Result<String, ConfigError> {
    Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|source| ConfigError::InvalidUrl {
            url: base.to_string(),
            source,
        })
}
