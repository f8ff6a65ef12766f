//! Worker Module
//!
//! One worker generation: lifecycle, routing and the strategy executors it
//! dispatches to.
//!
//! # Lifecycle
//! 1. Install: precache the manifest, then ask to skip waiting
//! 2. Activate: delete stale partitions, then claim clients
//! 3. Fetch: route every intercepted request to a strategy

pub mod lifecycle;
pub mod messages;
pub mod registration;
pub mod router;
pub mod strategy;


use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{
    resolve_url, CacheVersion, CapturedResponse, FetchRequest, PartitionRole, PartitionSet,
    PartitionStore, RequestDescriptor,
};
use crate::config::Config;
use crate::error::{Result, ShellError};
use crate::network::Network;

pub use lifecycle::{ActivateReport, InstallReport, ManifestFailure, WorkerState};
pub use messages::{ControlMessage, VersionReply};
pub use registration::Registration;
pub use router::{classify, Route};
pub use strategy::{StrategyExecutor, CACHE_FIRST_OFFLINE_BODY, NETWORK_FIRST_OFFLINE_BODY};

// == Worker Options ==
/// Everything that defines one worker generation.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    /// Origin the worker serves; same-origin requests go network-first
    pub origin: String,
    pub version: CacheVersion,
    pub partitions: PartitionSet,
    /// Precache manifest, as configured (relative paths allowed)
    pub manifest: Vec<String>,
    /// Path or URL of the offline fallback page
    pub offline_page: String,
    /// Ask to be promoted as soon as install finishes
    pub skip_waiting: bool,
}

impl WorkerOptions {
    /// Options with versioned partition names and an empty manifest.
    pub fn new(origin: impl Into<String>, namespace: &str, version: impl Into<String>) -> Self {
        let version = CacheVersion::new(version);
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            partitions: PartitionSet::versioned(namespace, &version),
            version,
            manifest: Vec::new(),
            offline_page: "/offline.html".to_string(),
            skip_waiting: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.origin, &config.namespace, &config.cache_version)
            .with_manifest(config.precache_assets.clone())
            .with_offline_page(&config.offline_page)
    }

    pub fn with_manifest(mut self, manifest: Vec<String>) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn with_offline_page(mut self, offline_page: impl Into<String>) -> Self {
        self.offline_page = offline_page.into();
        self
    }

    pub fn with_partitions(mut self, partitions: PartitionSet) -> Self {
        self.partitions = partitions;
        self
    }

    /// With `false` the installed worker stays waiting until a
    /// `SKIP_WAITING` message promotes it.
    pub fn with_skip_waiting(mut self, skip_waiting: bool) -> Self {
        self.skip_waiting = skip_waiting;
        self
    }
}

// == Service Worker ==
/// A single worker generation.
pub struct ServiceWorker {
    id: u64,
    options: WorkerOptions,
    store: Arc<dyn PartitionStore>,
    network: Arc<dyn Network>,
    executor: StrategyExecutor,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    controlling: AtomicBool,
}

impl ServiceWorker {
    pub fn new(
        options: WorkerOptions,
        store: Arc<dyn PartitionStore>,
        network: Arc<dyn Network>,
    ) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);

        let offline_url = resolve_url(&options.origin, &options.offline_page);
        let executor = StrategyExecutor::new(
            store.clone(),
            network.clone(),
            options.partitions.clone(),
            offline_url,
        );

        Self {
            id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
            options,
            store,
            network,
            executor,
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            controlling: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn version(&self) -> &CacheVersion {
        &self.options.version
    }

    pub fn partitions(&self) -> &PartitionSet {
        &self.options.partitions
    }

    pub fn origin(&self) -> &str {
        &self.options.origin
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Set once install finishes; the registration promotes such workers
    /// without waiting for old clients to go away.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// True once the worker has claimed its clients.
    pub fn is_controlling(&self) -> bool {
        self.controlling.load(Ordering::SeqCst)
    }

    // == Install ==
    /// Precaches the manifest (best effort) and requests skip-waiting unless
    /// the options turned it off.
    pub async fn install(&self) -> Result<InstallReport> {
        self.transition(WorkerState::Parsed, WorkerState::Installing)
            .await?;
        info!("Installing worker {} ({})", self.id, self.options.version);

        let manifest: Vec<String> = self
            .options
            .manifest
            .iter()
            .map(|entry| resolve_url(&self.options.origin, entry))
            .collect();
        let report = lifecycle::precache(
            &self.store,
            &self.network,
            self.partitions().name(PartitionRole::Precache),
            &manifest,
        )
        .await;

        self.transition(WorkerState::Installing, WorkerState::Installed)
            .await?;
        self.skip_waiting
            .store(self.options.skip_waiting, Ordering::SeqCst);
        info!("Installation of worker {} complete", self.id);
        Ok(report)
    }

    // == Activate ==
    /// Deletes stale partitions, then claims clients.
    pub async fn activate(&self) -> Result<ActivateReport> {
        self.transition(WorkerState::Installed, WorkerState::Activating)
            .await?;
        info!("Activating worker {} ({})", self.id, self.options.version);

        let report = lifecycle::cleanup_stale_partitions(&self.store, self.partitions()).await;

        self.transition(WorkerState::Activating, WorkerState::Activated)
            .await?;
        self.controlling.store(true, Ordering::SeqCst);
        info!(
            "Activation of worker {} complete, {} stale partition(s) removed",
            self.id,
            report.deleted.len()
        );
        Ok(report)
    }

    /// Retires this generation. It stops intercepting immediately.
    pub async fn mark_redundant(&self) {
        *self.state.write().await = WorkerState::Redundant;
        self.controlling.store(false, Ordering::SeqCst);
        info!("Worker {} is now redundant", self.id);
    }

    // == Fetch ==
    pub fn route(&self, descriptor: &RequestDescriptor) -> Route {
        classify(descriptor, &self.options.origin)
    }

    /// Handles an intercepted request.
    ///
    /// Returns None when the request is not intercepted (non-GET, or the
    /// worker is not active); the caller forwards it to the network as-is.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Option<CapturedResponse> {
        if !self.state().await.can_intercept_fetch() {
            return None;
        }

        let route = self.route(&request.descriptor);
        debug!(
            "{} {} -> {:?}",
            request.descriptor.method(),
            request.descriptor.url(),
            route
        );

        match route {
            Route::Passthrough => None,
            Route::NetworkFirst => Some(self.executor.network_first(request).await),
            Route::CacheFirst(role) => {
                let partition = self.partitions().name(role);
                Some(self.executor.cache_first(request, partition).await)
            }
        }
    }

    async fn transition(&self, expected: WorkerState, next: WorkerState) -> Result<()> {
        let mut state = self.state.write().await;
        if *state != expected {
            return Err(ShellError::InvalidState {
                expected,
                actual: *state,
            });
        }
        *state = next;
        Ok(())
    }
}
