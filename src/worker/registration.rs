//! Registration
//!
//! Holds the active and waiting worker generations over one shared store,
//! and answers control messages.

use std::sync::Arc;

use tokio::sync::{oneshot, RwLock};
use tracing::{debug, info, warn};

use super::{ControlMessage, InstallReport, ServiceWorker, VersionReply};
use crate::cache::{CapturedResponse, FetchRequest, PartitionStore};
use crate::error::{Result, ShellError};

/// Active/waiting generations sharing a partition store.
pub struct Registration {
    store: Arc<dyn PartitionStore>,
    active: RwLock<Option<Arc<ServiceWorker>>>,
    waiting: RwLock<Option<Arc<ServiceWorker>>>,
}

impl Registration {
    pub fn new(store: Arc<dyn PartitionStore>) -> Self {
        Self {
            store,
            active: RwLock::new(None),
            waiting: RwLock::new(None),
        }
    }

    pub fn store(&self) -> &Arc<dyn PartitionStore> {
        &self.store
    }

    pub async fn active(&self) -> Option<Arc<ServiceWorker>> {
        self.active.read().await.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<ServiceWorker>> {
        self.waiting.read().await.clone()
    }

    // == Register ==
    /// Installs `worker` and parks it as the waiting generation.
    ///
    /// It is activated right away when it asked to skip waiting or when
    /// nothing is active yet; otherwise it waits for `SKIP_WAITING`.
    pub async fn register(&self, worker: Arc<ServiceWorker>) -> Result<InstallReport> {
        let report = worker.install().await?;

        let replaced = self.waiting.write().await.replace(worker.clone());
        if let Some(old) = replaced {
            old.mark_redundant().await;
        }

        if worker.skip_waiting_requested() || self.active().await.is_none() {
            self.skip_waiting().await?;
        }
        Ok(report)
    }

    // == Skip Waiting ==
    /// Promotes the waiting generation, if any. Returns whether one was
    /// promoted; calling it with nothing waiting is a no-op.
    pub async fn skip_waiting(&self) -> Result<bool> {
        let Some(next) = self.waiting.write().await.take() else {
            debug!("Skip waiting requested with no waiting worker");
            return Ok(false);
        };

        next.activate().await?;

        let previous = self.active.write().await.replace(next.clone());
        if let Some(previous) = previous {
            previous.mark_redundant().await;
        }
        info!(
            "Worker {} ({}) now controls all clients",
            next.id(),
            next.version()
        );
        Ok(true)
    }

    // == Clear All Caches ==
    /// Deletes every partition, current or not. Returns the deleted names.
    pub async fn clear_all_caches(&self) -> Vec<String> {
        let mut deleted = Vec::new();
        for name in self.store.partition_names().await {
            if self.store.delete(&name).await {
                deleted.push(name);
            }
        }
        info!("Cleared {} partition(s)", deleted.len());
        deleted
    }

    /// Version of the active generation, falling back to the waiting one.
    pub async fn version(&self) -> Option<String> {
        match self.active().await {
            Some(worker) => Some(worker.version().to_string()),
            None => self.waiting().await.map(|w| w.version().to_string()),
        }
    }

    // == Fetch ==
    /// Hands the request to the active generation. None means "not
    /// intercepted": forward it unchanged.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Option<CapturedResponse> {
        let worker = self.active().await?;
        worker.handle_fetch(request).await
    }

    // == Messages ==
    /// Dispatches a control message. `GET_VERSION` needs `reply`; the other
    /// messages ignore it.
    pub async fn handle_message(
        &self,
        message: ControlMessage,
        reply: Option<oneshot::Sender<VersionReply>>,
    ) -> Result<()> {
        debug!("Control message {}", message.kind());

        match message {
            ControlMessage::SkipWaiting => {
                self.skip_waiting().await?;
            }
            ControlMessage::ClearCache => {
                self.clear_all_caches().await;
            }
            ControlMessage::GetVersion => {
                let reply = reply.ok_or(ShellError::MissingReplyChannel(message.kind()))?;
                let version = self.version().await.ok_or(ShellError::NoWorker)?;
                if reply.send(VersionReply { version }).is_err() {
                    warn!("GET_VERSION reply channel closed before the reply was sent");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, MemoryPartitionStore, PartitionSet, RequestDescriptor};
    use crate::network::StubNetwork;
    use crate::worker::{WorkerOptions, WorkerState};

    const ORIGIN: &str = "http://app.test";

    struct Fixture {
        store: Arc<MemoryPartitionStore>,
        network: Arc<StubNetwork>,
        registration: Registration,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryPartitionStore::new());
        let network = Arc::new(StubNetwork::new());
        network.respond("http://app.test/", CapturedResponse::ok("home"));
        network.respond("http://app.test/offline.html", CapturedResponse::ok("offline"));
        Fixture {
            registration: Registration::new(store.clone()),
            store,
            network,
        }
    }

    fn generation(f: &Fixture, options: WorkerOptions) -> Arc<ServiceWorker> {
        Arc::new(ServiceWorker::new(
            options.with_manifest(vec!["/".to_string(), "/offline.html".to_string()]),
            f.store.clone(),
            f.network.clone(),
        ))
    }

    #[tokio::test]
    async fn test_register_activates_first_worker() {
        let f = fixture();
        let worker = generation(&f, WorkerOptions::new(ORIGIN, "shell", "v1"));

        f.registration.register(worker.clone()).await.unwrap();

        let active = f.registration.active().await.unwrap();
        assert_eq!(active.id(), worker.id());
        assert_eq!(active.state().await, WorkerState::Activated);
        assert!(f.registration.waiting().await.is_none());
    }

    #[tokio::test]
    async fn test_new_generation_supersedes_old_and_drops_its_partitions() {
        let f = fixture();
        let v1 = generation(&f, WorkerOptions::new(ORIGIN, "shell", "v1"));
        let v2 = generation(&f, WorkerOptions::new(ORIGIN, "shell", "v2"));

        f.registration.register(v1.clone()).await.unwrap();
        assert_eq!(f.store.partition_names().await, vec!["shell-precache-v1"]);

        f.registration.register(v2.clone()).await.unwrap();

        assert_eq!(v1.state().await, WorkerState::Redundant);
        assert_eq!(v2.state().await, WorkerState::Activated);
        assert_eq!(f.store.partition_names().await, vec!["shell-precache-v2"]);
        assert_eq!(f.registration.version().await.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_activate_cleanup_keeps_shared_partitions() {
        let f = fixture();
        for name in ["precache-v1", "runtime", "image"] {
            f.store
                .put(name, CacheKey::get("http://app.test/x"), CapturedResponse::ok("x"))
                .await
                .unwrap();
        }
        let worker = generation(
            &f,
            WorkerOptions::new(ORIGIN, "shell", "v2").with_partitions(PartitionSet::from_names(
                "precache-v2",
                "runtime",
                "image",
            )),
        );
        f.network.set_online(false);

        f.registration.register(worker).await.unwrap();

        // Install opened precache-v2; activation removed only precache-v1
        assert_eq!(
            f.store.partition_names().await,
            vec!["runtime", "image", "precache-v2"]
        );
    }

    #[tokio::test]
    async fn test_skip_waiting_message_promotes_waiting_generation() {
        let f = fixture();
        let v1 = generation(&f, WorkerOptions::new(ORIGIN, "shell", "v1"));
        let v2 = generation(
            &f,
            WorkerOptions::new(ORIGIN, "shell", "v2").with_skip_waiting(false),
        );
        f.registration.register(v1.clone()).await.unwrap();

        f.registration.register(v2.clone()).await.unwrap();

        // v2 is installed but parked; v1 keeps control and its partitions
        assert_eq!(v2.state().await, WorkerState::Installed);
        assert_eq!(f.registration.waiting().await.unwrap().id(), v2.id());
        assert_eq!(f.registration.active().await.unwrap().id(), v1.id());
        assert_eq!(f.registration.version().await.as_deref(), Some("v1"));
        assert_eq!(
            f.store.partition_names().await,
            vec!["shell-precache-v1", "shell-precache-v2"]
        );

        f.registration
            .handle_message(ControlMessage::SkipWaiting, None)
            .await
            .unwrap();

        assert_eq!(v1.state().await, WorkerState::Redundant);
        assert_eq!(v2.state().await, WorkerState::Activated);
        assert!(f.registration.waiting().await.is_none());
        assert_eq!(f.registration.version().await.as_deref(), Some("v2"));
        assert_eq!(f.store.partition_names().await, vec!["shell-precache-v2"]);
    }

    #[tokio::test]
    async fn test_first_worker_activates_even_without_skip_waiting() {
        let f = fixture();
        let worker = generation(
            &f,
            WorkerOptions::new(ORIGIN, "shell", "v1").with_skip_waiting(false),
        );

        f.registration.register(worker.clone()).await.unwrap();

        assert!(!worker.skip_waiting_requested());
        assert_eq!(f.registration.active().await.unwrap().id(), worker.id());
    }

    #[tokio::test]
    async fn test_skip_waiting_without_waiting_worker_is_noop() {
        let f = fixture();
        let worker = generation(&f, WorkerOptions::new(ORIGIN, "shell", "v1"));
        f.registration.register(worker.clone()).await.unwrap();

        assert!(!f.registration.skip_waiting().await.unwrap());
        f.registration
            .handle_message(ControlMessage::SkipWaiting, None)
            .await
            .unwrap();

        assert_eq!(f.registration.active().await.unwrap().id(), worker.id());
    }

    #[tokio::test]
    async fn test_clear_cache_message_removes_everything() {
        let f = fixture();
        let worker = generation(&f, WorkerOptions::new(ORIGIN, "shell", "v1"));
        f.registration.register(worker).await.unwrap();
        f.store
            .put("unrelated", CacheKey::get("http://app.test/y"), CapturedResponse::ok("y"))
            .await
            .unwrap();

        f.registration
            .handle_message(ControlMessage::ClearCache, None)
            .await
            .unwrap();
        f.registration
            .handle_message(ControlMessage::ClearCache, None)
            .await
            .unwrap();

        assert!(f.store.partition_names().await.is_empty());
    }

    #[tokio::test]
    async fn test_get_version_replies_over_channel() {
        let f = fixture();
        let worker = generation(&f, WorkerOptions::new(ORIGIN, "shell", "v1.0.0"));
        f.registration.register(worker).await.unwrap();

        let (tx, rx) = oneshot::channel();
        f.registration
            .handle_message(ControlMessage::GetVersion, Some(tx))
            .await
            .unwrap();

        assert_eq!(rx.await.unwrap().version, "v1.0.0");
    }

    #[tokio::test]
    async fn test_get_version_without_reply_channel() {
        let f = fixture();
        let worker = generation(&f, WorkerOptions::new(ORIGIN, "shell", "v1"));
        f.registration.register(worker).await.unwrap();

        let result = f
            .registration
            .handle_message(ControlMessage::GetVersion, None)
            .await;

        assert!(matches!(
            result,
            Err(ShellError::MissingReplyChannel("GET_VERSION"))
        ));
    }

    #[tokio::test]
    async fn test_get_version_with_no_worker() {
        let f = fixture();
        let (tx, _rx) = oneshot::channel();

        let result = f
            .registration
            .handle_message(ControlMessage::GetVersion, Some(tx))
            .await;

        assert!(matches!(result, Err(ShellError::NoWorker)));
    }

    #[tokio::test]
    async fn test_fetch_without_active_worker_is_not_intercepted() {
        let f = fixture();
        let request = FetchRequest::new(RequestDescriptor::get("http://app.test/"));

        assert!(f.registration.handle_fetch(&request).await.is_none());
    }
}
