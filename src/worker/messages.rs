//! Control Messages
//!
//! Tagged payloads clients send to the worker: `{"type": "SKIP_WAITING"}`,
//! `{"type": "CLEAR_CACHE"}` and `{"type": "GET_VERSION"}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Promote the waiting generation now
    SkipWaiting,
    /// Delete every partition
    ClearCache,
    /// Reply with the worker version
    GetVersion,
}

impl ControlMessage {
    /// Wire name of the message type.
    pub fn kind(&self) -> &'static str {
        match self {
            ControlMessage::SkipWaiting => "SKIP_WAITING",
            ControlMessage::ClearCache => "CLEAR_CACHE",
            ControlMessage::GetVersion => "GET_VERSION",
        }
    }
}

/// Payload sent back over the reply channel of `GET_VERSION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReply {
    pub version: String,
}
