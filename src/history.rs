// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Move journal with undo support

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::archive::transfer::{self, TransferError};
use crate::{KiroError, Result};

/// A single archive operation in history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub original_path: PathBuf,
    pub new_path: PathBuf,
    pub year_month: String,
    pub undone: bool,
}

impl HistoryEntry {
    pub fn new(original_path: PathBuf, new_path: PathBuf, year_month: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            original_path,
            new_path,
            year_month,
            undone: false,
        }
    }
}

/// Result of undoing one entry
#[derive(Debug, PartialEq, Eq)]
pub enum UndoOutcome {
    Restored,
    /// The archived file is gone
    Missing,
    /// Something already sits at the original path
    Occupied,
}

/// History manager for tracking archive moves (JSON lines)
pub struct History {
    path: PathBuf,
}

impl History {
    /// Create a new history manager
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append an entry to the history
    pub fn append(&self, entry: &HistoryEntry) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;

        Ok(())
    }

    /// Read all history entries
    pub fn read_all(&self) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!("Failed to parse history entry: {}", e);
                }
            }
        }

        Ok(entries)
    }

    /// Get the most recent N entries (newest first)
    pub fn get_recent(&self, count: usize) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.read_all()?;
        entries.reverse();
        entries.truncate(count);
        Ok(entries)
    }

    /// Mark an entry as undone
    pub fn mark_undone(&self, id: &str) -> Result<()> {
        let entries = self.read_all()?;

        // Rewrite the entire file with the updated entry
        let file = File::create(&self.path)?;
        let mut writer = std::io::BufWriter::new(file);

        for mut entry in entries {
            if entry.id == id {
                entry.undone = true;
            }
            let json = serde_json::to_string(&entry)?;
            writeln!(writer, "{}", json)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Get entries that haven't been undone
    pub fn get_undoable(&self) -> Result<Vec<HistoryEntry>> {
        let entries = self.read_all()?;
        Ok(entries.into_iter().filter(|e| !e.undone).collect())
    }

    /// Move an archived file back to where it came from, never overwriting
    pub fn undo(&self, entry: &HistoryEntry) -> Result<UndoOutcome> {
        if !entry.new_path.exists() {
            return Ok(UndoOutcome::Missing);
        }
        if let Some(parent) = entry.original_path.parent() {
            fs::create_dir_all(parent)?;
        }

        match transfer::move_no_clobber(&entry.new_path, &entry.original_path) {
            Ok(()) => {
                self.mark_undone(&entry.id)?;
                info!("Restored {:?} -> {:?}", entry.new_path, entry.original_path);
                Ok(UndoOutcome::Restored)
            }
            Err(TransferError::SourceGone) => Ok(UndoOutcome::Missing),
            Err(TransferError::DestinationTaken) => Ok(UndoOutcome::Occupied),
            Err(TransferError::Io(e)) => Err(KiroError::move_failed(&entry.new_path, &entry.original_path, e)),
        }
    }

    /// Clear all history
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    /// Get history file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}
