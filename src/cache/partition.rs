//! Partition Naming Module
//!
//! Derives the three current partition names from a namespace and an
//! explicit cache version. Any partition outside the resulting set is stale.

use std::fmt;

// == Cache Version ==
/// Version value threaded through partition names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheVersion(String);

impl CacheVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Partition Role ==
/// The three roles a current partition can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartitionRole {
    /// Install-time static manifest
    Precache,
    /// Dynamic responses
    Runtime,
    /// Image-destination responses
    Image,
}

impl PartitionRole {
    /// Lookup order used when searching every current partition.
    pub const ALL: [PartitionRole; 3] = [
        PartitionRole::Precache,
        PartitionRole::Runtime,
        PartitionRole::Image,
    ];

    fn label(&self) -> &'static str {
        match self {
            PartitionRole::Precache => "precache",
            PartitionRole::Runtime => "runtime",
            PartitionRole::Image => "images",
        }
    }
}

impl fmt::Display for PartitionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// == Partition Set ==
/// Names of the current precache, runtime and image partitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSet {
    precache: String,
    runtime: String,
    image: String,
}

impl PartitionSet {
    /// Names every partition `{namespace}-{role}-{version}`.
    pub fn versioned(namespace: &str, version: &CacheVersion) -> Self {
        let name = |role: PartitionRole| format!("{}-{}-{}", namespace, role, version);
        Self {
            precache: name(PartitionRole::Precache),
            runtime: name(PartitionRole::Runtime),
            image: name(PartitionRole::Image),
        }
    }

    /// Uses explicit names, e.g. to keep runtime data across a precache bump.
    pub fn from_names(
        precache: impl Into<String>,
        runtime: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            precache: precache.into(),
            runtime: runtime.into(),
            image: image.into(),
        }
    }

    pub fn name(&self, role: PartitionRole) -> &str {
        match role {
            PartitionRole::Precache => &self.precache,
            PartitionRole::Runtime => &self.runtime,
            PartitionRole::Image => &self.image,
        }
    }

    /// Current partition names in lookup order.
    pub fn allow_list(&self) -> [&str; 3] {
        PartitionRole::ALL.map(|role| self.name(role))
    }

    /// Returns true when `name` belongs to this generation.
    pub fn is_current(&self, name: &str) -> bool {
        self.allow_list().contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned_names() {
        let set = PartitionSet::versioned("shell", &CacheVersion::new("v1.0.0"));
        assert_eq!(set.name(PartitionRole::Precache), "shell-precache-v1.0.0");
        assert_eq!(set.name(PartitionRole::Runtime), "shell-runtime-v1.0.0");
        assert_eq!(set.name(PartitionRole::Image), "shell-images-v1.0.0");
    }

    #[test]
    fn test_version_bump_renames_every_partition() {
        let v1 = PartitionSet::versioned("shell", &CacheVersion::new("v1"));
        let v2 = PartitionSet::versioned("shell", &CacheVersion::new("v2"));
        for name in v1.allow_list() {
            assert!(!v2.is_current(name), "{} should be stale under v2", name);
        }
    }

    #[test]
    fn test_explicit_names() {
        let set = PartitionSet::from_names("precache-v2", "runtime", "image");
        assert_eq!(set.allow_list(), ["precache-v2", "runtime", "image"]);
        assert!(set.is_current("runtime"));
        assert!(!set.is_current("precache-v1"));
    }
}
