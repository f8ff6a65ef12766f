//! Lifecycle Controller
//!
//! Install populates the precache partition from the manifest; activate
//! deletes every partition outside the current allow-list.

use std::fmt;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::{FetchRequest, PartitionSet, PartitionStore, RequestDescriptor};
use crate::network::Network;

// == Worker State ==
/// Lifecycle states of one worker generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Created, nothing run yet
    Parsed,
    Installing,
    /// Precache done, waiting to activate
    Installed,
    Activating,
    /// Intercepting requests
    Activated,
    /// Superseded by a newer generation
    Redundant,
}

impl WorkerState {
    /// Only activated workers intercept requests.
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Parsed => write!(f, "parsed"),
            WorkerState::Installing => write!(f, "installing"),
            WorkerState::Installed => write!(f, "installed"),
            WorkerState::Activating => write!(f, "activating"),
            WorkerState::Activated => write!(f, "activated"),
            WorkerState::Redundant => write!(f, "redundant"),
        }
    }
}

// == Reports ==
/// One manifest entry that could not be precached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestFailure {
    pub url: String,
    pub reason: String,
}

/// Outcome of install. Failures never abort the other entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstallReport {
    /// URLs written to the precache partition, in manifest order
    pub stored: Vec<String>,
    pub failures: Vec<ManifestFailure>,
}

/// Outcome of activate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivateReport {
    /// Stale partitions removed
    pub deleted: Vec<String>,
}

// == Install ==
/// Fetches every manifest URL concurrently and stores the ok responses in
/// `partition`.
///
/// Each entry is independent: a fetch error, an error status or a failed
/// write is logged and reported, and the rest of the manifest still lands.
pub async fn precache(
    store: &Arc<dyn PartitionStore>,
    network: &Arc<dyn Network>,
    partition: &str,
    manifest: &[String],
) -> InstallReport {
    if let Err(e) = store.open(partition).await {
        warn!("Failed to open precache partition {}: {}", partition, e);
    }

    let results = join_all(manifest.iter().map(|url| async move {
        let request = FetchRequest::new(RequestDescriptor::get(url.as_str()));

        let response = network.fetch(&request).await.map_err(|e| e.to_string())?;
        if !response.is_ok() {
            return Err(format!("unexpected status {}", response.status));
        }

        store
            .put(partition, request.descriptor.cache_key(), response)
            .await
            .map_err(|e| e.to_string())
    }))
    .await;

    let mut report = InstallReport::default();
    for (url, result) in manifest.iter().zip(results) {
        match result {
            Ok(()) => report.stored.push(url.clone()),
            Err(reason) => {
                warn!("Failed to precache {}: {}", url, reason);
                report.failures.push(ManifestFailure {
                    url: url.clone(),
                    reason,
                });
            }
        }
    }

    info!(
        "Precached {}/{} manifest entries into {}",
        report.stored.len(),
        manifest.len(),
        partition
    );
    report
}

// == Activate ==
/// Deletes every partition not in `partitions`' allow-list.
///
/// Never creates a partition; current ones are created lazily on write.
pub async fn cleanup_stale_partitions(
    store: &Arc<dyn PartitionStore>,
    partitions: &PartitionSet,
) -> ActivateReport {
    let mut report = ActivateReport::default();

    for name in store.partition_names().await {
        if partitions.is_current(&name) {
            continue;
        }
        if store.delete(&name).await {
            info!("Deleted stale partition {}", name);
            report.deleted.push(name);
        }
    }

    report
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, CapturedResponse, MemoryPartitionStore};
    use crate::network::StubNetwork;

    fn setup() -> (Arc<dyn PartitionStore>, Arc<StubNetwork>) {
        (
            Arc::new(MemoryPartitionStore::new()),
            Arc::new(StubNetwork::new()),
        )
    }

    #[tokio::test]
    async fn test_precache_stores_every_entry() {
        let (store, stub) = setup();
        stub.respond("http://app.test/", CapturedResponse::ok("root"));
        stub.respond("https://cdn.test/lib.css", CapturedResponse::ok("css"));
        let network: Arc<dyn Network> = stub;

        let manifest = vec![
            "http://app.test/".to_string(),
            "https://cdn.test/lib.css".to_string(),
        ];
        let report = precache(&store, &network, "precache", &manifest).await;

        assert_eq!(report.stored, manifest);
        assert!(report.failures.is_empty());
        assert_eq!(
            store
                .lookup("precache", &CacheKey::get("https://cdn.test/lib.css"))
                .await
                .unwrap()
                .text(),
            "css"
        );
    }

    #[tokio::test]
    async fn test_precache_failure_does_not_abort_others() {
        let (store, stub) = setup();
        stub.respond("http://app.test/a", CapturedResponse::ok("a"));
        stub.fail("http://app.test/b");
        stub.respond("http://app.test/d", CapturedResponse::ok("d"));
        // "/c" has no route and answers 404
        let network: Arc<dyn Network> = stub;

        let manifest: Vec<String> = ["a", "b", "c", "d"]
            .iter()
            .map(|p| format!("http://app.test/{}", p))
            .collect();
        let report = precache(&store, &network, "precache", &manifest).await;

        assert_eq!(report.stored, vec!["http://app.test/a", "http://app.test/d"]);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].url, "http://app.test/b");
        assert!(report.failures[1].reason.contains("404"));
        assert_eq!(store.len("precache").await, Some(2));
    }

    #[tokio::test]
    async fn test_precache_offline_still_completes() {
        let (store, stub) = setup();
        stub.set_online(false);
        let network: Arc<dyn Network> = stub;

        let manifest = vec!["http://app.test/".to_string()];
        let report = precache(&store, &network, "precache", &manifest).await;

        assert!(report.stored.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(store.len("precache").await, Some(0));
    }

    #[tokio::test]
    async fn test_cleanup_deletes_only_stale_partitions() {
        let (store, _) = setup();
        for name in ["precache-v1", "runtime", "image"] {
            store
                .put(name, CacheKey::get("http://app.test/x"), CapturedResponse::ok("x"))
                .await
                .unwrap();
        }

        let current = PartitionSet::from_names("precache-v2", "runtime", "image");
        let report = cleanup_stale_partitions(&store, &current).await;

        assert_eq!(report.deleted, vec!["precache-v1".to_string()]);
        assert_eq!(store.partition_names().await, vec!["runtime", "image"]);
    }

    #[tokio::test]
    async fn test_cleanup_never_creates_partitions() {
        let (store, _) = setup();

        let current = PartitionSet::from_names("precache-v2", "runtime", "image");
        let report = cleanup_stale_partitions(&store, &current).await;

        assert!(report.deleted.is_empty());
        assert!(store.partition_names().await.is_empty());
    }

    #[test]
    fn test_only_activated_intercepts() {
        assert!(WorkerState::Activated.can_intercept_fetch());
        assert!(!WorkerState::Installed.can_intercept_fetch());
        assert!(!WorkerState::Redundant.can_intercept_fetch());
    }
}
