use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConditionalConfig {
    /// Domain -> upstream endpoint queried for that domain and its subdomains.
    #[serde(default)]
    pub mapping: BTreeMap<String, String>,
}
