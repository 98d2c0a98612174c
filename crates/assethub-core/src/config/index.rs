//! Folder index cache configuration.

use serde::{Deserialize, Serialize};

/// Folder index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// How long a cached folder lookup (hit or miss) is trusted.
    #[serde(default = "default_folder_cache_ttl")]
    pub folder_cache_ttl_seconds: u64,
    /// Maximum number of cached folder lookups.
    #[serde(default = "default_folder_cache_capacity")]
    pub folder_cache_capacity: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            folder_cache_ttl_seconds: default_folder_cache_ttl(),
            folder_cache_capacity: default_folder_cache_capacity(),
        }
    }
}

fn default_folder_cache_ttl() -> u64 {
    60
}

fn default_folder_cache_capacity() -> u64 {
    10_000
}
