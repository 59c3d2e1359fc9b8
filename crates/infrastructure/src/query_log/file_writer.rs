use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use warden_dns_application::ports::{QueryLogEntry, QueryLogWriter};
use warden_dns_domain::DomainError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const ALL_CLIENTS: &str = "ALL";

/// Tab-separated daily log files: `YYYY-MM-DD_ALL.log`, or one file per
/// client and day (`YYYY-MM-DD_<client>.log`).
#[derive(Debug)]
pub struct FileQueryLogWriter {
    dir: PathBuf,
    per_client: bool,
}

impl FileQueryLogWriter {
    pub async fn open(dir: impl Into<PathBuf>, per_client: bool) -> Result<Self, DomainError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            DomainError::QueryLog(format!("cannot create '{}': {}", dir.display(), e))
        })?;
        info!(dir = %dir.display(), per_client, "Query log files enabled");
        Ok(Self { dir, per_client })
    }

    pub fn file_path(&self, entry: &QueryLogEntry) -> PathBuf {
        let client = if self.per_client {
            sanitize_file_component(&entry.client_label())
        } else {
            ALL_CLIENTS.to_string()
        };
        self.dir.join(format!(
            "{}_{}.log",
            entry.timestamp.format(DATE_FORMAT),
            client
        ))
    }
}

fn sanitize_file_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn format_line(entry: &QueryLogEntry) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        entry.client_ip,
        entry.client_label(),
        entry.duration_ms,
        entry.reason,
        entry.question,
        entry.answer,
        entry.response_code
    )
}

fn file_date(path: &Path) -> Option<NaiveDate> {
    let name = path.file_name()?.to_str()?;
    if !name.ends_with(".log") {
        return None;
    }
    NaiveDate::parse_from_str(name.get(..10)?, DATE_FORMAT).ok()
}

#[async_trait]
impl QueryLogWriter for FileQueryLogWriter {
    async fn write(&self, entry: &QueryLogEntry) -> Result<(), DomainError> {
        let path = self.file_path(entry);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| DomainError::QueryLog(format!("cannot open '{}': {}", path.display(), e)))?;

        file.write_all(format_line(entry).as_bytes())
            .await
            .map_err(|e| DomainError::QueryLog(format!("cannot write '{}': {}", path.display(), e)))
    }

    async fn cleanup_older_than(&self, days: u64) -> Result<(), DomainError> {
        let cutoff = Local::now().date_naive() - ChronoDuration::days(days as i64);
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            DomainError::QueryLog(format!("cannot list '{}': {}", self.dir.display(), e))
        })?;

        while let Some(dir_entry) = entries
            .next_entry()
            .await
            .map_err(|e| DomainError::QueryLog(e.to_string()))?
        {
            let path = dir_entry.path();
            if file_date(&path).is_some_and(|date| date < cutoff) {
                tokio::fs::remove_file(&path).await.map_err(|e| {
                    DomainError::QueryLog(format!("cannot remove '{}': {}", path.display(), e))
                })?;
                debug!(file = %path.display(), "Removed old query log");
            }
        }
        Ok(())
    }
}
