//! OrcaHello → Orcasite detection relay.
//!
//! Each poll cycle reads the destination's feed directory, the source's
//! recent detections and the destination's most recent detections, then
//! forwards every source detection the destination does not already hold.

pub mod decode;
pub mod dedup;
pub mod driver;
pub mod endpoints;
pub mod error;
pub mod fetch;
pub mod health;
pub mod reconcile;
pub mod resolver;
pub mod shutdown;
pub mod submit;
pub mod transport;

pub use dedup::{check_presence, DedupVerdict, PresenceReason};
pub use driver::{DriverStatus, PollDriver, SharedStatus};
pub use endpoints::Endpoints;
pub use error::{
    ConfigError, CycleError, FetchError, FetchStage, ResolveError, SubmitError, TransportError,
};
pub use reconcile::{CyclePhase, CycleReport, Reconciler};
pub use resolver::FeedResolver;
pub use shutdown::Shutdown;
pub use submit::{DetectionSubmitter, SubmitReceipt, JSON_API_MEDIA_TYPE};
pub use transport::{HttpTransport, OutboundRequest, Transport, TransportResponse};
