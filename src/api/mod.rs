//! API Module
//!
//! HTTP surface of the proxy.
//!
//! # Endpoints
//! - `GET /__shell/health` - Health check with the active worker version
//! - `GET /__shell/stats` - Partition store statistics
//! - `POST /__shell/message` - Control messages (SKIP_WAITING, CLEAR_CACHE, GET_VERSION)
//! - anything else - intercepted by the active worker or passed through

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
