//! Response DTOs for the control API
//!
//! Defines the structure of outgoing JSON bodies on `/__shell/*`.

use serde::Serialize;

use crate::cache::CacheStats;

/// Entry count of one partition (GET /__shell/stats)
#[derive(Debug, Clone, Serialize)]
pub struct PartitionSummary {
    pub name: String,
    pub entries: usize,
}

/// Response body for the stats endpoint (GET /__shell/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Lookups that found an entry
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Entries written
    pub writes: u64,
    /// Partitions deleted by activation or clears
    pub partitions_deleted: u64,
    /// Entries across all partitions
    pub total_entries: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    pub partitions: Vec<PartitionSummary>,
}

impl StatsResponse {
    /// Creates a new StatsResponse from store statistics
    pub fn new(stats: &CacheStats, partitions: Vec<PartitionSummary>) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            writes: stats.writes,
            partitions_deleted: stats.partitions_deleted,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
            partitions,
        }
    }
}

/// Response body for the health endpoint (GET /__shell/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Version of the active worker, if any
    pub version: Option<String>,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(version: Option<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            version,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for control messages (POST /__shell/message)
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// Message type that was handled
    #[serde(rename = "type")]
    pub kind: String,
    pub accepted: bool,
    /// Present for GET_VERSION
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl MessageResponse {
    pub fn accepted(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            accepted: true,
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_from_cache_stats() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        stats.record_write();
        stats.set_total_entries(1);

        let resp = StatsResponse::new(
            &stats,
            vec![PartitionSummary {
                name: "shell-runtime-v1".to_string(),
                entries: 1,
            }],
        );
        assert!((resp.hit_rate - 0.75).abs() < 0.001);
        assert_eq!(resp.writes, 1);
        assert_eq!(resp.partitions[0].name, "shell-runtime-v1");
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy(Some("v1.0.0".to_string()));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("v1.0.0"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_message_response_serialize() {
        let plain = serde_json::to_value(MessageResponse::accepted("CLEAR_CACHE")).unwrap();
        assert_eq!(plain["type"], "CLEAR_CACHE");
        assert_eq!(plain["accepted"], true);
        assert!(plain.get("version").is_none());

        let versioned =
            serde_json::to_value(MessageResponse::accepted("GET_VERSION").with_version("v2")).unwrap();
        assert_eq!(versioned["version"], "v2");
    }
}
