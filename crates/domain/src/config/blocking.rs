use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_CLIENT_GROUP: &str = "default";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlockingConfig {
    /// Group name -> entries; an entry is a domain or a path to a hosts-style file.
    #[serde(default)]
    pub black_lists: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub white_lists: BTreeMap<String, Vec<String>>,

    /// Client name, IP or CIDR -> blacklist groups applied to that client.
    #[serde(default)]
    pub client_groups_block: BTreeMap<String, Vec<String>>,

    #[serde(default = "default_block_ttl")]
    pub block_ttl_secs: u32,
}

impl BlockingConfig {
    pub fn is_enabled(&self) -> bool {
        !self.black_lists.is_empty()
    }
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            black_lists: BTreeMap::new(),
            white_lists: BTreeMap::new(),
            client_groups_block: BTreeMap::new(),
            block_ttl_secs: default_block_ttl(),
        }
    }
}

fn default_block_ttl() -> u32 {
    21_600
}
