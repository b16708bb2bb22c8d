//! Cache configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Sizing and freshness parameters for the weather cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of cities held at once; the least recently used
    /// entry is evicted on overflow.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Time-to-live for a cached record, in seconds. An entry older than
    /// this is stale and removed on read.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_max_entries() -> usize {
    10
}

fn default_ttl_secs() -> u64 {
    600
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Rejects non-positive sizing parameters before any cache is built.
    pub fn validate(&self) -> Result<(), Error> {
        let mut issues: Vec<String> = Vec::new();

        if self.max_entries == 0 {
            issues.push("max_entries must be > 0".into());
        }
        if self.ttl_secs == 0 {
            issues.push("ttl_secs must be > 0".into());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "invalid cache config: {}",
                issues.join("; ")
            )))
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
        }
    }
}
