//! Strategy Executors
//!
//! Network-first and cache-first interception, sharing the offline fallback.
//! Every path ends in a concrete response; nothing here returns an error.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{
    CacheKey, CapturedResponse, FetchRequest, PartitionRole, PartitionSet, PartitionStore,
};
use crate::network::Network;
use crate::tasks::spawn_background_refresh;

/// Body of the synthetic 503 from network-first.
pub const NETWORK_FIRST_OFFLINE_BODY: &str = "Offline";

/// Body of the synthetic 503 from cache-first.
pub const CACHE_FIRST_OFFLINE_BODY: &str = "Resource not available offline";

/// Runs the interception strategies against one store and network.
#[derive(Clone)]
pub struct StrategyExecutor {
    store: Arc<dyn PartitionStore>,
    network: Arc<dyn Network>,
    partitions: PartitionSet,
    /// Key of the page served to failed navigations
    offline_key: CacheKey,
}

impl StrategyExecutor {
    pub fn new(
        store: Arc<dyn PartitionStore>,
        network: Arc<dyn Network>,
        partitions: PartitionSet,
        offline_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            network,
            partitions,
            offline_key: CacheKey::get(offline_url),
        }
    }

    // == Network First ==
    /// Tries the network; on ok the response is copied into the runtime
    /// partition before returning. On failure falls back to any current
    /// partition, then the offline page (navigations) or a 503.
    pub async fn network_first(&self, request: &FetchRequest) -> CapturedResponse {
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    let runtime = self.partitions.name(PartitionRole::Runtime);
                    self.store_copy(runtime, request, &response).await;
                }
                response
            }
            Err(e) => {
                warn!(
                    "Network request failed, trying cache: {} ({})",
                    request.descriptor.url(),
                    e
                );

                let key = request.descriptor.cache_key();
                if let Some(cached) = self
                    .store
                    .lookup_any(&self.partitions.allow_list(), &key)
                    .await
                {
                    return cached;
                }

                self.offline_response(request, NETWORK_FIRST_OFFLINE_BODY)
                    .await
            }
        }
    }

    // == Cache First ==
    /// Serves from `partition` when possible, refreshing the entry in a
    /// detached task. On a miss fetches synchronously and stores ok
    /// responses before returning.
    pub async fn cache_first(&self, request: &FetchRequest, partition: &str) -> CapturedResponse {
        let key = request.descriptor.cache_key();

        if let Some(cached) = self.store.lookup(partition, &key).await {
            debug!("Cache hit for {} in {}", key, partition);
            // Detached: the handle is dropped and the result never observed
            drop(spawn_background_refresh(
                self.store.clone(),
                self.network.clone(),
                partition.to_string(),
                request.clone(),
            ));
            return cached;
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.store_copy(partition, request, &response).await;
                }
                response
            }
            Err(e) => {
                warn!("Failed to fetch {}: {}", request.descriptor.url(), e);
                self.offline_response(request, CACHE_FIRST_OFFLINE_BODY)
                    .await
            }
        }
    }

    // == Shared Fallback ==
    /// Offline page for navigations, synthetic 503 otherwise or when the
    /// offline page itself is not cached.
    async fn offline_response(
        &self,
        request: &FetchRequest,
        unavailable_body: &'static str,
    ) -> CapturedResponse {
        if request.descriptor.is_navigation() {
            if let Some(page) = self
                .store
                .lookup_any(&self.partitions.allow_list(), &self.offline_key)
                .await
            {
                return page;
            }
            warn!("Offline page {} is not cached", self.offline_key.url);
        }

        CapturedResponse::service_unavailable(unavailable_body)
    }

    async fn store_copy(&self, partition: &str, request: &FetchRequest, response: &CapturedResponse) {
        if let Err(e) = self
            .store
            .put(partition, request.descriptor.cache_key(), response.clone())
            .await
        {
            warn!("Failed to cache {} in {}: {}", request.descriptor.url(), partition, e);
        }
    }
}
