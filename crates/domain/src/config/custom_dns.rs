use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CustomDnsConfig {
    /// Domain -> addresses answered for A/AAAA questions.
    #[serde(default)]
    pub mapping: BTreeMap<String, Vec<String>>,

    #[serde(default = "default_custom_ttl")]
    pub ttl_secs: u32,
}

impl Default for CustomDnsConfig {
    fn default() -> Self {
        Self {
            mapping: BTreeMap::new(),
            ttl_secs: default_custom_ttl(),
        }
    }
}

fn default_custom_ttl() -> u32 {
    3600
}
