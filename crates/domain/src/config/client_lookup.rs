use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClientLookupConfig {
    /// Upstream used for reverse (PTR) lookups of client addresses.
    #[serde(default)]
    pub upstream: Option<String>,

    /// 1-based positions tried in order when a PTR lookup yields several names.
    #[serde(default)]
    pub single_name_order: Vec<usize>,

    /// Static client names: name -> addresses.
    #[serde(default)]
    pub clients: BTreeMap<String, Vec<String>>,
}
