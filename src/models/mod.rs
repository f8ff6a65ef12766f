//! Response models for the control API
//!
//! DTOs serialized on the `/__shell/*` endpoints. Control messages
//! themselves are deserialized straight into
//! [`ControlMessage`](crate::worker::ControlMessage).

pub mod responses;

// Re-export commonly used types
pub use responses::{HealthResponse, MessageResponse, PartitionSummary, StatsResponse};
