// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Event processing: Detected -> Classified -> Archived | Skipped | Failed

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::archive::{ArchiveMover, ArchiveTarget};
use crate::classifier::{classify, is_image};
use crate::clock::Clock;
use crate::history::{History, HistoryEntry};
use crate::paths::ResolvedPaths;
use crate::stability::StabilityWaiter;
use crate::watcher::{should_process, WatchEvent};
use crate::{AppConfig, KiroError, Result};

/// How many archived or planned source paths are remembered to absorb duplicate events
const RECENT_CAPACITY: usize = 256;

/// Why a file was left alone
#[derive(Debug)]
pub enum SkipReason {
    /// Hidden, temporary, system file or a non-UTF-8 name
    Excluded,
    NotAnImage,
    NotAScreenshot,
    /// A directory or other non-regular entry
    NotAFile,
    /// Duplicate event for a file this organizer already moved
    AlreadyArchived,
    /// Dry run: duplicate event for a file already reported
    AlreadyPlanned,
    /// Dry run: where it would have gone
    DryRun(ArchiveTarget),
}

/// Terminal state of one event
#[derive(Debug)]
pub enum Outcome {
    Archived(PathBuf),
    Skipped(SkipReason),
    Failed(KiroError),
}

/// Counters for a scan or watch session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub moved: usize,
    pub planned: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Runs files through classification, stability wait and archiving
pub struct Organizer {
    source: PathBuf,
    image_extensions: Vec<String>,
    mover: ArchiveMover,
    waiter: StabilityWaiter,
    history: Option<History>,
    dry_run: bool,
    recent: VecDeque<PathBuf>,
    stats: RunStats,
}

impl Organizer {
    pub fn new(paths: &ResolvedPaths, config: &AppConfig, clock: Arc<dyn Clock>) -> Self {
        let history = config
            .history
            .enabled
            .then(|| History::new(config.history.path_under(&paths.archive_root)));

        Self {
            source: paths.source.clone(),
            image_extensions: config.image_extensions.clone(),
            mover: ArchiveMover::new(&paths.archive_root, clock.clone()),
            waiter: StabilityWaiter::from_config(&config.stability, clock),
            history,
            dry_run: false,
            recent: VecDeque::with_capacity(RECENT_CAPACITY),
            stats: RunStats::default(),
        }
    }

    /// Report what would be moved without touching disk
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Process one watcher event, waiting for the file to settle first
    pub async fn handle(&mut self, event: &WatchEvent) -> Outcome {
        let path = &event.source_path;
        debug!("{:?} event for {:?} at {}", event.kind, path, event.detected_at.format("%H:%M:%S%.3f"));

        // A dry run leaves the file in place, so it stays a duplicate while it exists
        if self.recent.contains(path) && (self.dry_run || !path.exists()) {
            let reason = if self.dry_run {
                SkipReason::AlreadyPlanned
            } else {
                SkipReason::AlreadyArchived
            };
            let outcome = Outcome::Skipped(reason);
            self.record(path, &outcome);
            return outcome;
        }

        self.process(path, true).await
    }

    /// One-shot pass over the files already in the source directory
    pub async fn scan(&mut self) -> Result<RunStats> {
        if !self.source.is_dir() {
            return Err(KiroError::SourceUnavailable(self.source.clone()));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.source)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        files.sort();

        info!("Organizing {} files from {:?}", files.len(), self.source);
        for path in files {
            self.process(&path, false).await;
        }

        Ok(self.stats)
    }

    async fn process(&mut self, path: &Path, wait_for_stable: bool) -> Outcome {
        let outcome = self.evaluate(path, wait_for_stable).await;
        self.record(path, &outcome);
        outcome
    }

    async fn evaluate(&mut self, path: &Path, wait_for_stable: bool) -> Outcome {
        if !should_process(path) {
            return Outcome::Skipped(SkipReason::Excluded);
        }
        if !is_image(path, &self.image_extensions) {
            return Outcome::Skipped(SkipReason::NotAnImage);
        }

        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        if !classify(&name).is_screenshot() {
            return Outcome::Skipped(SkipReason::NotAScreenshot);
        }

        match std::fs::metadata(path) {
            Ok(meta) if !meta.is_file() => return Outcome::Skipped(SkipReason::NotAFile),
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Outcome::Failed(KiroError::SourceUnavailable(path.to_path_buf()))
            }
            Err(e) => return Outcome::Failed(e.into()),
        }

        if wait_for_stable {
            if let Err(e) = self.waiter.wait(path).await {
                return Outcome::Failed(e);
            }
        }

        if self.dry_run {
            return match self.mover.plan(path) {
                Ok(target) => {
                    self.remember(path);
                    Outcome::Skipped(SkipReason::DryRun(target))
                }
                Err(e) => Outcome::Failed(e),
            };
        }

        match self.mover.archive(path) {
            Ok(dest) => {
                self.remember(path);
                self.journal(path, &dest);
                Outcome::Archived(dest)
            }
            Err(e) => Outcome::Failed(e),
        }
    }

    fn remember(&mut self, path: &Path) {
        if self.recent.len() == RECENT_CAPACITY {
            self.recent.pop_front();
        }
        self.recent.push_back(path.to_path_buf());
    }

    fn journal(&self, original: &Path, dest: &Path) {
        let Some(history) = &self.history else {
            return;
        };

        let year_month = month_folder(dest);
        let entry = HistoryEntry::new(original.to_path_buf(), dest.to_path_buf(), year_month);
        if let Err(e) = history.append(&entry) {
            warn!("Failed to write history entry for {:?}: {}", dest, e);
        }
    }

    fn record(&mut self, path: &Path, outcome: &Outcome) {
        let name = path.file_name().unwrap_or(path.as_os_str());
        match outcome {
            Outcome::Archived(dest) => {
                self.stats.moved += 1;
                info!("Moved: {:?} -> {}", name, month_folder(dest));
            }
            Outcome::Skipped(SkipReason::DryRun(target)) => {
                self.stats.planned += 1;
                info!("DRY RUN: Would move {:?} -> {:?}", name, target.path());
            }
            Outcome::Skipped(reason) => {
                self.stats.skipped += 1;
                debug!("Skipped {:?}: {:?}", path, reason);
            }
            Outcome::Failed(e) => {
                self.stats.errors += 1;
                error!("Error processing {:?}: {}", path, e);
            }
        }
    }
}

/// Name of the month folder a destination lives in
fn month_folder(dest: &Path) -> String {
    dest.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
