use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use warden_dns_application::ports::{QueryLogEntry, QueryLogWriter};

const RETENTION_INTERVAL: Duration = Duration::from_secs(3600);

/// Hands query log entries to a background writer task so logging never
/// delays a response. At most `capacity` entries wait for the writer; the
/// rest are dropped.
#[derive(Clone)]
pub struct QueryLogEmitter {
    sender: mpsc::Sender<QueryLogEntry>,
}

impl QueryLogEmitter {
    /// Spawns the consumer task that feeds every entry to `writer`.
    ///
    /// `capacity` must be greater than zero.
    pub fn spawn(writer: Arc<dyn QueryLogWriter>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<QueryLogEntry>(capacity);

        let handle = tokio::spawn(async move {
            while let Some(entry) = receiver.recv().await {
                if let Err(e) = writer.write(&entry).await {
                    warn!(error = %e, "Failed to write query log entry");
                }
            }
            debug!("Query log channel closed");
        });

        (Self { sender }, handle)
    }

    /// Queues `entry` without waiting. Returns false when it was dropped.
    pub fn emit(&self, entry: QueryLogEntry) -> bool {
        match self.sender.try_send(entry) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Query log channel full, dropping entry");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("Query log channel closed");
                false
            }
        }
    }
}

impl std::fmt::Debug for QueryLogEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryLogEmitter")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

/// Removes logs older than `days` once per hour.
pub fn spawn_retention_task(writer: Arc<dyn QueryLogWriter>, days: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RETENTION_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = writer.cleanup_older_than(days).await {
                warn!(error = %e, "Query log cleanup failed");
            }
        }
    })
}
