//! Request Router
//!
//! Pure classification of an intercepted request into a strategy.

use axum::http::Method;

use crate::cache::{Destination, PartitionRole, RequestDescriptor};

/// Where an intercepted request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not intercepted; forwarded to the network untouched
    Passthrough,
    NetworkFirst,
    /// Cache-first against the partition playing this role
    CacheFirst(PartitionRole),
}

/// Classifies `request` for a worker serving `worker_origin`.
///
/// Depends only on method, destination and whether the request origin
/// matches the worker origin.
pub fn classify(request: &RequestDescriptor, worker_origin: &str) -> Route {
    if *request.method() != Method::GET {
        return Route::Passthrough;
    }

    if request.destination() == Destination::Image {
        return Route::CacheFirst(PartitionRole::Image);
    }

    if is_same_origin(request, worker_origin) {
        Route::NetworkFirst
    } else {
        Route::CacheFirst(PartitionRole::Runtime)
    }
}

fn is_same_origin(request: &RequestDescriptor, worker_origin: &str) -> bool {
    match request.origin() {
        Some(origin) => origin.eq_ignore_ascii_case(worker_origin.trim_end_matches('/')),
        None => false,
    }
}
