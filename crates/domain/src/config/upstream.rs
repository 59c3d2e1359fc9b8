use crate::upstream::Upstream;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// One entry yields a lone terminal resolver, several yield a parallel race.
    #[serde(default)]
    pub servers: Vec<String>,

    /// Bound for a single upstream exchange.
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,

    /// Overall bound for racing all upstreams.
    #[serde(default = "default_parallel_timeout_ms")]
    pub parallel_timeout_ms: u64,
}

impl UpstreamConfig {
    pub fn parsed_servers(&self) -> Result<Vec<Upstream>, String> {
        self.servers.iter().map(|s| s.parse::<Upstream>()).collect()
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            servers: vec!["udp://8.8.8.8:53".to_string(), "udp://1.1.1.1:53".to_string()],
            query_timeout_ms: default_query_timeout_ms(),
            parallel_timeout_ms: default_parallel_timeout_ms(),
        }
    }
}

fn default_query_timeout_ms() -> u64 {
    2000
}

fn default_parallel_timeout_ms() -> u64 {
    5000
}
