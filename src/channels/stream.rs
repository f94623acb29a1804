//! Byte-stream sinks: standard error, standard output and append-only files.

use crate::core::{Channel, Record};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Writes each record's formatted text as one line to an async writer.
pub struct StreamChannel<W> {
    name: String,
    writer: Mutex<W>,
}

impl<W> StreamChannel<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the channel and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl StreamChannel<tokio::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new("stderr", tokio::io::stderr())
    }
}

impl StreamChannel<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new("stdout", tokio::io::stdout())
    }
}

impl StreamChannel<tokio::fs::File> {
    /// Opens `path` for appending, creating it if needed.
    pub async fn file(path: &Path) -> Result<Self> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        Ok(Self::new(format!("file:{}", path.display()), file))
    }
}

#[async_trait]
impl<W> Channel for StreamChannel<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, record: &Record) -> Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(record.formatted().as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(())
    }
}
