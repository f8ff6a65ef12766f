//! Background Refresh Task
//!
//! Re-fetches a resource that was just served from cache and overwrites the
//! cached entry on success.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::{FetchRequest, PartitionStore};
use crate::network::Network;

/// Spawns a detached refresh of `request` into `partition`.
///
/// The task owns clones of everything it touches, so the caller can return
/// its response right away. Network failures, non-ok statuses and write
/// failures are all swallowed: the caller already served the cached copy.
///
/// # Returns
/// The JoinHandle of the spawned task. Callers normally drop it; tests may
/// await it.
pub fn spawn_background_refresh(
    store: Arc<dyn PartitionStore>,
    network: Arc<dyn Network>,
    partition: String,
    request: FetchRequest,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let url = request.descriptor.url().to_string();

        let response = match network.fetch(&request).await {
            Ok(response) if response.is_ok() => response,
            Ok(response) => {
                debug!("Background refresh of {} got {}, keeping cached copy", url, response.status);
                return;
            }
            Err(e) => {
                debug!("Background refresh of {} failed: {}", url, e);
                return;
            }
        };

        match store
            .put(&partition, request.descriptor.cache_key(), response)
            .await
        {
            Ok(()) => debug!("Refreshed {} in {}", url, partition),
            Err(e) => debug!("Background refresh write to {} failed: {}", partition, e),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CapturedResponse, MemoryPartitionStore, RequestDescriptor};
    use crate::network::StubNetwork;

    const URL: &str = "https://cdn.example.com/lib.css";

    fn setup() -> (Arc<MemoryPartitionStore>, Arc<StubNetwork>, FetchRequest) {
        (
            Arc::new(MemoryPartitionStore::new()),
            Arc::new(StubNetwork::new()),
            FetchRequest::new(RequestDescriptor::get(URL)),
        )
    }

    #[tokio::test]
    async fn test_refresh_overwrites_entry() {
        let (store, network, request) = setup();
        let key = request.descriptor.cache_key();
        store
            .put("runtime", key.clone(), CapturedResponse::ok("stale"))
            .await
            .unwrap();
        network.respond(URL, CapturedResponse::ok("fresh"));

        spawn_background_refresh(store.clone(), network, "runtime".to_string(), request)
            .await
            .unwrap();

        assert_eq!(store.lookup("runtime", &key).await.unwrap().text(), "fresh");
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_cached_copy() {
        let (store, network, request) = setup();
        let key = request.descriptor.cache_key();
        store
            .put("runtime", key.clone(), CapturedResponse::ok("stale"))
            .await
            .unwrap();
        network.set_online(false);

        let handle =
            spawn_background_refresh(store.clone(), network, "runtime".to_string(), request);

        // Failure is swallowed inside the task, so it still completes normally
        assert!(handle.await.is_ok());
        assert_eq!(store.lookup("runtime", &key).await.unwrap().text(), "stale");
    }

    #[tokio::test]
    async fn test_refresh_ignores_error_status() {
        let (store, network, request) = setup();
        let key = request.descriptor.cache_key();
        store
            .put("runtime", key.clone(), CapturedResponse::ok("stale"))
            .await
            .unwrap();
        network.respond(URL, CapturedResponse::new(500, "boom"));

        spawn_background_refresh(store.clone(), network, "runtime".to_string(), request)
            .await
            .unwrap();

        assert_eq!(store.lookup("runtime", &key).await.unwrap().text(), "stale");
    }
}
