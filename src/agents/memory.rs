use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::AppError;

/// Entries kept per user; older ones are dropped first.
const MAX_ENTRIES_PER_SCOPE: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub task: String,
    pub input: String,
    pub output: String,
    pub recorded_at: String,
}

#[async_trait]
pub trait AgentMemory: Send + Sync {
    /// Up to `limit` most recent entries for `scope`, oldest first.
    async fn recall(&self, scope: &str, limit: usize) -> Result<Vec<MemoryEntry>, AppError>;

    /// Newest entry for `scope` written by `task`, however old.
    async fn latest(&self, scope: &str, task: &str) -> Result<Option<MemoryEntry>, AppError>;

    async fn remember(&self, scope: &str, entry: MemoryEntry) -> Result<(), AppError>;
}

/// Drops the oldest entries beyond `max`, sparing the newest entry of each task
/// so a long run of one task cannot push out another task's last result.
fn trim_entries(entries: &mut Vec<MemoryEntry>, max: usize) {
    let mut idx = 0;
    while entries.len() > max && idx < entries.len() {
        let task = &entries[idx].task;
        let superseded = entries[idx + 1..].iter().any(|e| &e.task == task);
        if superseded {
            entries.remove(idx);
        } else {
            idx += 1;
        }
    }
}

type MemoryFile = BTreeMap<String, Vec<MemoryEntry>>;

/// JSON file holding every scope's entries.
pub struct FileMemory {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileMemory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> anyhow::Result<MemoryFile> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) if raw.is_empty() => Ok(MemoryFile::new()),
            Ok(raw) => serde_json::from_slice(&raw)
                .with_context(|| format!("parse agent memory {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(MemoryFile::new()),
            Err(e) => Err(e).with_context(|| format!("read agent memory {}", self.path.display())),
        }
    }

    async fn store(&self, file: &MemoryFile) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create {}", dir.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(file)?)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replace {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl AgentMemory for FileMemory {
    async fn recall(&self, scope: &str, limit: usize) -> Result<Vec<MemoryEntry>, AppError> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let entries = file.remove(scope).unwrap_or_default();
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.into_iter().skip(skip).collect())
    }

    async fn latest(&self, scope: &str, task: &str) -> Result<Option<MemoryEntry>, AppError> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let entries = file.remove(scope).unwrap_or_default();
        Ok(entries.into_iter().rev().find(|e| e.task == task))
    }

    async fn remember(&self, scope: &str, entry: MemoryEntry) -> Result<(), AppError> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        let entries = file.entry(scope.to_string()).or_default();
        entries.push(entry);
        trim_entries(entries, MAX_ENTRIES_PER_SCOPE);
        debug!(scope, entries = entries.len(), "agent memory updated");
        self.store(&file).await?;
        Ok(())
    }
}
