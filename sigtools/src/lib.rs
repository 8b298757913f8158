pub mod cfg;
pub mod de;
pub mod frame;
pub mod ser;

use thiserror::Error;

/// Timestamp value reported before any trigger has fired
pub const TRIGGER_NEVER: i64 = -1;

/// Ticks aggregated into one outbound frame unless configured otherwise
pub const SUBFRAMES_PER_FRAME: usize = 20;

/// Everything that can go wrong in the bridge.
///
/// Only [`Error::Decode`] is recoverable: the offending control payload
/// is dropped and the dispatcher keeps serving. Every other variant
/// tears the process down.
#[derive(Debug, Error)]
pub enum Error {
    /// Unusable startup state: bad config, bad template, wrong vector width
    #[error("configuration: {0}")]
    Config(String),
    /// Malformed inbound control payload
    #[error("control decode: {0}")]
    Decode(#[source] serde_json::Error),
    /// Outbound message serialization failed
    #[error("encode: {0}")]
    Encode(#[source] serde_json::Error),
    /// Trigger port unavailable or a pulse write failed
    #[error("trigger hardware: {0}")]
    Hardware(#[source] std::io::Error),
    /// The sample stream ended or broke
    #[error("upstream: {0}")]
    Upstream(String),
    /// The telemetry connection ended or broke
    #[error("transport: {0}")]
    Transport(String),
}
