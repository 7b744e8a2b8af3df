//! Relay error types, one per reconciliation stage.

use std::fmt;

use thiserror::Error;

use orca_core::DecodeError;

/// Failure below the HTTP status line: connect, TLS, timeout, body read.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport error: {0}")]
    Other(String),
}

/// A required read could not produce usable records.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{url} returned {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(#[from] DecodeError),
}

/// A source location name has no destination feed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no destination feed named `{canonical}` (source location `{location}`)")]
    UnknownLocation { location: String, canonical: String },
}

/// The outbound write did not land.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("destination rejected detection with {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to encode detection payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Invalid endpoint configuration detected at start-up.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid endpoint URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Which of the three required reads failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Feeds,
    SourceDetections,
    DestinationDetections,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchStage::Feeds => "destination feeds",
            FetchStage::SourceDetections => "source detections",
            FetchStage::DestinationDetections => "destination detections",
        };
        f.write_str(name)
    }
}

/// A cycle aborted before any submission was attempted.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("{stage} fetch failed: {source}")]
    Fetch {
        stage: FetchStage,
        #[source]
        source: FetchError,
    },
}

impl CycleError {
    pub fn fetch(stage: FetchStage, source: FetchError) -> Self {
        CycleError::Fetch { stage, source }
    }

    pub fn stage(&self) -> FetchStage {
        match self {
            CycleError::Fetch { stage, .. } => *stage,
        }
    }
}
