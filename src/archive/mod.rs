// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Month-partitioned screenshot archive

pub mod transfer;

use chrono::{DateTime, Local, Utc};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::{KiroError, Result};
use transfer::TransferError;

/// Subfolder of the archive root holding the month folders
pub const SCREENSHOTS_DIR: &str = "Screenshots";

/// Upper bound on destination names tried for a single file
pub const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Where a file will land
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveTarget {
    pub root: PathBuf,
    /// `YYYY-MM` of the file's last modification
    pub year_month: String,
    pub final_name: OsString,
}

impl ArchiveTarget {
    /// `<root>/Screenshots/<YYYY-MM>`
    pub fn dir(&self) -> PathBuf {
        self.root.join(SCREENSHOTS_DIR).join(&self.year_month)
    }

    pub fn path(&self) -> PathBuf {
        self.dir().join(&self.final_name)
    }
}

/// Moves screenshots into the archive without ever overwriting
pub struct ArchiveMover {
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl ArchiveMover {
    pub fn new(root: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            root: root.into(),
            clock,
        }
    }

    /// Compute the target for `source` without touching the archive
    pub fn plan(&self, source: &Path) -> Result<ArchiveTarget> {
        let year_month = year_month_of(source)?;
        let file_name = file_name_of(source)?;
        let dir = self.root.join(SCREENSHOTS_DIR).join(&year_month);
        let stamp = self.clock.now();

        let final_name = (0..MAX_NAME_ATTEMPTS)
            .map(|attempt| collision_name(file_name, stamp, attempt))
            .find(|name| !occupied(&dir.join(name)))
            .ok_or_else(|| exhausted(source, &dir))?;

        Ok(ArchiveTarget {
            root: self.root.clone(),
            year_month,
            final_name,
        })
    }

    /// Move `source` into its month folder and return the final path
    pub fn archive(&self, source: &Path) -> Result<PathBuf> {
        let year_month = year_month_of(source)?;
        let file_name = file_name_of(source)?;
        let dir = self.root.join(SCREENSHOTS_DIR).join(&year_month);

        fs::create_dir_all(&dir).map_err(|e| KiroError::DirectoryCreate {
            path: dir.clone(),
            source: e,
        })?;

        let stamp = self.clock.now();
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let dest = dir.join(collision_name(file_name, stamp, attempt));
            if occupied(&dest) {
                continue;
            }

            match transfer::move_no_clobber(source, &dest) {
                Ok(()) => {
                    if attempt > 0 {
                        info!("Name collision, archived as {:?}", dest.file_name().unwrap_or_default());
                    }
                    debug!("Archived {:?} -> {:?}", source, dest);
                    return Ok(dest);
                }
                Err(TransferError::DestinationTaken) => {
                    debug!("{:?} was taken during the move, trying next name", dest);
                }
                Err(TransferError::SourceGone) => {
                    return Err(KiroError::SourceUnavailable(source.to_path_buf()));
                }
                Err(TransferError::Io(e)) => {
                    return Err(KiroError::move_failed(source, &dest, e));
                }
            }
        }

        Err(exhausted(source, &dir))
    }
}

/// Destination name for the given attempt.
///
/// Attempt 0 keeps the name, 1 appends a second-precision stamp, 2 a
/// microsecond stamp, and later attempts add a counter after the microseconds.
pub fn collision_name(file_name: &OsStr, stamp: DateTime<Local>, attempt: u32) -> OsString {
    if attempt == 0 {
        return file_name.to_os_string();
    }

    let path = Path::new(file_name);
    let stem = path.file_stem().unwrap_or(file_name);

    let suffix = match attempt {
        1 => stamp.format("_%Y%m%d_%H%M%S").to_string(),
        2 => stamp.format("_%Y%m%d_%H%M%S_%6f").to_string(),
        n => format!("{}_{}", stamp.format("_%Y%m%d_%H%M%S_%6f"), n - 2),
    };

    let mut name = stem.to_os_string();
    name.push(suffix);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    name
}

/// `YYYY-MM` of the last modification, in local time
fn year_month_of(source: &Path) -> Result<String> {
    let meta = match fs::metadata(source) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(KiroError::SourceUnavailable(source.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    if !meta.is_file() {
        return Err(KiroError::NotAFile(source.to_path_buf()));
    }

    let modified = local_time(meta.modified()?)
        .ok_or_else(|| KiroError::InvalidTimestamp(source.to_path_buf()))?;
    Ok(modified.format("%Y-%m").to_string())
}

/// `None` when the time falls outside what chrono can represent
fn local_time(t: SystemTime) -> Option<DateTime<Local>> {
    let epoch = DateTime::<Utc>::from_timestamp(0, 0)?;
    let utc = match t.duration_since(UNIX_EPOCH) {
        Ok(after) => epoch.checked_add_signed(chrono::Duration::from_std(after).ok()?)?,
        Err(e) => epoch.checked_sub_signed(chrono::Duration::from_std(e.duration()).ok()?)?,
    };
    Some(utc.with_timezone(&Local))
}

fn file_name_of(source: &Path) -> Result<&OsStr> {
    source
        .file_name()
        .ok_or_else(|| KiroError::NotAFile(source.to_path_buf()))
}

fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn exhausted(source: &Path, dir: &Path) -> KiroError {
    KiroError::MoveFailed {
        from: source.to_path_buf(),
        to: dir.to_path_buf(),
        reason: format!("no free name after {} attempts", MAX_NAME_ATTEMPTS),
    }
}
