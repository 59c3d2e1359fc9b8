use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryLogConfig {
    /// Directory for daily log files. Without it, entries go to the console log.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// One file per client and day instead of one file per day.
    #[serde(default)]
    pub per_client: bool,

    /// Files older than this many days are removed; 0 keeps everything.
    #[serde(default)]
    pub log_retention_days: u64,

    /// Entries queued for the writer; further entries are dropped while full.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for QueryLogConfig {
    fn default() -> Self {
        Self {
            dir: None,
            per_client: false,
            log_retention_days: 0,
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    10_000
}
