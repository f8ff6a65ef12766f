//! Network Module
//!
//! The fetch capability used by the worker. [`HttpNetwork`] talks to the real
//! upstream. `StubNetwork` is a scripted in-memory network for tests; it is
//! kept out of the public docs.

mod http;
#[doc(hidden)]
mod stub;

use async_trait::async_trait;
use thiserror::Error;

use crate::cache::{CapturedResponse, FetchRequest};

pub use http::HttpNetwork;
#[doc(hidden)]
pub use stub::StubNetwork;

// == Network Error ==
/// A fetch that produced no response at all.
///
/// HTTP error statuses are not errors here; they come back as responses.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("Upstream unreachable: {0}")]
    Unreachable(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

// == Network Trait ==
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<CapturedResponse, NetworkError>;
}
