//! Stub Network
//!
//! Scripted in-memory network: per-URL responses, an offline switch and a
//! gate that holds fetches until released.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use super::{Network, NetworkError};
use crate::cache::{CapturedResponse, FetchRequest};

#[derive(Debug, Clone)]
enum StubReply {
    Respond(CapturedResponse),
    Fail,
}

/// In-memory [`Network`] driven by a route table.
///
/// URLs without a route answer `404 Not Found`.
#[derive(Debug)]
pub struct StubNetwork {
    routes: Mutex<HashMap<String, StubReply>>,
    online: AtomicBool,
    fetch_count: AtomicUsize,
    fetched: Mutex<Vec<String>>,
    /// `true` while fetches may proceed
    gate: watch::Sender<bool>,
}

impl Default for StubNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl StubNetwork {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            routes: Mutex::new(HashMap::new()),
            online: AtomicBool::new(true),
            fetch_count: AtomicUsize::new(0),
            fetched: Mutex::new(Vec::new()),
            gate,
        }
    }

    /// Answers `url` with `response` from now on.
    pub fn respond(&self, url: impl Into<String>, response: CapturedResponse) {
        self.routes_guard()
            .insert(url.into(), StubReply::Respond(response));
    }

    /// Makes fetches of `url` fail as if the host were unreachable.
    pub fn fail(&self, url: impl Into<String>) {
        self.routes_guard().insert(url.into(), StubReply::Fail);
    }

    /// When offline every fetch fails.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Holds every fetch until [`StubNetwork::release`] is called.
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Number of fetches started, including held and failed ones.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// URLs fetched so far, in call order.
    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn routes_guard(&self) -> std::sync::MutexGuard<'_, HashMap<String, StubReply>> {
        self.routes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<CapturedResponse, NetworkError> {
        let url = request.descriptor.url().to_string();
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.fetched
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.clone());

        let mut gate = self.gate.subscribe();
        let opened = gate.wait_for(|open| *open).await.is_ok();
        if !opened {
            return Err(NetworkError::Unreachable(url));
        }

        if !self.online.load(Ordering::SeqCst) {
            return Err(NetworkError::Unreachable(url));
        }

        let reply = self.routes_guard().get(&url).cloned();
        match reply {
            Some(StubReply::Respond(response)) => Ok(CapturedResponse {
                captured_at: chrono::Utc::now(),
                ..response
            }),
            Some(StubReply::Fail) => Err(NetworkError::Unreachable(url)),
            None => Ok(CapturedResponse::new(404, "Not Found")),
        }
    }
}
