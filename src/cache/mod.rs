//! Cache Module
//!
//! Named cache partitions holding captured responses, keyed by request.

mod descriptor;
mod entry;
mod partition;
mod stats;
mod store;


// Re-export public types
pub use descriptor::{
    origin_of, resolve_url, CacheKey, Destination, FetchRequest, RequestDescriptor, RequestMode,
};
pub use entry::CapturedResponse;
pub use partition::{CacheVersion, PartitionRole, PartitionSet};
pub use stats::CacheStats;
pub use store::{MemoryPartitionStore, PartitionStore, StoreError};
