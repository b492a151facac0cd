use std::path::PathBuf;

use chrono::Utc;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("Could not write to the event log. {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not serialize the event. {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Journal for raw webhook deliveries, written before any dispatching happens.
///
/// This exists for observability and replaying during incident triage. A failure to record is
/// never allowed to block order processing.
#[allow(async_fn_in_trait)]
pub trait WebhookEventLog {
    async fn record(&self, topic: &str, payload: &Value) -> Result<(), EventLogError>;
}

/// Appends one JSON object per delivery to a local file.
#[derive(Debug, Clone)]
pub struct FileEventLog {
    path: PathBuf,
}

impl FileEventLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl WebhookEventLog for FileEventLog {
    async fn record(&self, topic: &str, payload: &Value) -> Result<(), EventLogError> {
        let line = serde_json::to_string(&json!({
            "received_at": Utc::now().to_rfc3339(),
            "topic": topic,
            "order": payload,
        }))?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        Ok(())
    }
}
