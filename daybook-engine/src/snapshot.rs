//! Plain-file persistence of engine state.
//!
//! Snapshots are written at lifecycle points (session start, explicit
//! save, session end) and restored at construction. This is a convenience
//! cache, not a durable offline queue.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::history::DayRecord;
use crate::model::{SessionId, Task};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub session_id: Option<SessionId>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub history: Vec<DayRecord>,
    #[serde(default = "default_next_local_id")]
    pub next_local_id: u64,
}

fn default_next_local_id() -> u64 {
    1
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Self {
            session_id: None,
            started_at: None,
            tasks: vec![],
            history: vec![],
            next_local_id: default_next_local_id(),
        }
    }
}

pub fn default_path() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Cannot determine config directory")?
        .join("daybook")
        .join("snapshot.json"))
}

/// Write a snapshot, creating parent directories as needed.
pub fn save(path: &Path, snapshot: &EngineSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let raw = serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;
    std::fs::write(path, raw)
        .with_context(|| format!("Failed to write snapshot at {}", path.display()))?;
    Ok(())
}

/// Read a snapshot. Returns None if no snapshot has been written yet.
pub fn load(path: &Path) -> Result<Option<EngineSnapshot>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot at {}", path.display()))?;
    let snapshot = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse snapshot at {}", path.display()))?;
    Ok(Some(snapshot))
}
