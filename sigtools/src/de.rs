//! Decoding of inbound control payloads

use serde::Deserialize;

use crate::Error;

/// One decoded trigger request: which hardware channel to pulse
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub struct Command {
    pub trigger_channel: u8,
}

/// Decode a single control payload. Bad JSON, a missing field, or a
/// channel outside `u8` range is a recoverable decode error: the caller
/// drops the command and keeps serving. Unknown extra fields pass.
pub fn command(payload: &[u8]) -> Result<Command, Error> {
    serde_json::from_slice(payload).map_err(Error::Decode)
}
