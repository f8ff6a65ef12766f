//! Offline Shell - an offline-first caching proxy
//!
//! Runs a service-worker style lifecycle in front of an upstream site:
//! versioned cache partitions, per-request caching strategies and an
//! offline fallback page.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod network;
pub mod tasks;
pub mod worker;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{Result, ShellError};
pub use worker::{Registration, ServiceWorker, WorkerOptions};
