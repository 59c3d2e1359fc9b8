use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CachingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Lower bound applied to the answer TTL; 0 leaves it untouched.
    #[serde(default)]
    pub min_ttl_secs: u32,

    /// Upper bound applied to the answer TTL; 0 leaves it untouched.
    #[serde(default)]
    pub max_ttl_secs: u32,
}

impl CachingConfig {
    pub fn clamp_ttl(&self, ttl: u32) -> u32 {
        let ttl = ttl.max(self.min_ttl_secs);
        if self.max_ttl_secs > 0 {
            ttl.min(self.max_ttl_secs)
        } else {
            ttl
        }
    }
}

impl Default for CachingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_max_entries(),
            min_ttl_secs: 0,
            max_ttl_secs: 0,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_entries() -> usize {
    100_000
}
