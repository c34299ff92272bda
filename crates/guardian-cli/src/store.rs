//! History file storage
//!
//! The core keeps history in memory only. The CLI persists a session as a
//! JSON array of scored receipts, rewritten atomically on every change.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use guardian_core::SessionHistory;
use tempfile::NamedTempFile;

/// Load a history file; a missing file is an empty history
pub fn load_history(path: &Path) -> Result<SessionHistory> {
    if !path.exists() {
        return Ok(SessionHistory::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read history file {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(SessionHistory::new());
    }

    serde_json::from_str(&content)
        .with_context(|| format!("Invalid history file {}", path.display()))
}

/// Write a history file via a temp file in the same directory
pub fn save_history(path: &Path, history: &SessionHistory) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).context("Failed to create temp history file")?;
    serde_json::to_writer_pretty(&mut tmp, history).context("Failed to serialize history")?;
    tmp.write_all(b"\n")?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write history file {}", path.display()))?;

    Ok(())
}
