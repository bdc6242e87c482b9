// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! File system watcher for the source directory

use chrono::{DateTime, Local};
use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::Duration;
use tracing::info;

use crate::{KiroError, Result};

/// What the notifier saw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    /// A file appeared (created or renamed into the directory)
    Created,
    /// A writer closed the file
    Closed,
}

/// A file that showed up in the watched directory
#[derive(Debug, Clone)]
pub struct WatchEvent {
    pub source_path: PathBuf,
    pub detected_at: DateTime<Local>,
    pub kind: WatchEventKind,
}

impl WatchEvent {
    pub fn new(source_path: PathBuf, kind: WatchEventKind) -> Self {
        Self {
            source_path,
            detected_at: Local::now(),
            kind,
        }
    }
}

/// File system watcher
pub struct FileWatcher {
    watcher: RecommendedWatcher,
    event_rx: Receiver<notify::Result<Event>>,
}

impl FileWatcher {
    /// Create a new file watcher
    pub fn new() -> Result<Self> {
        let (tx, rx) = channel();

        let config = Config::default()
            .with_poll_interval(Duration::from_secs(2));

        let watcher = RecommendedWatcher::new(tx, config)?;

        Ok(Self {
            watcher,
            event_rx: rx,
        })
    }

    /// Add a directory to watch (non-recursive)
    pub fn watch(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::create_dir_all(path)?;
            info!("Created watch directory: {:?}", path);
        }

        self.watcher.watch(path, RecursiveMode::NonRecursive)?;
        info!("Watching: {:?}", path);

        Ok(())
    }

    /// Get the next relevant event (blocking with timeout)
    pub fn next_event(&self, timeout: Duration) -> Option<Result<WatchEvent>> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(Ok(event)) => convert_event(event).map(Ok),
            Ok(Err(e)) => Some(Err(e.into())),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                Some(Err(KiroError::Watch(notify::Error::generic("Watcher disconnected"))))
            }
        }
    }
}

/// Map a notify event onto the two signals the organizer cares about
fn convert_event(event: Event) -> Option<WatchEvent> {
    let (kind, path) = match event.kind {
        EventKind::Create(CreateKind::Folder) => return None,
        EventKind::Create(_) => (WatchEventKind::Created, event.paths.first()),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => (WatchEventKind::Created, event.paths.first()),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => (WatchEventKind::Created, event.paths.get(1)),
        // FSEvents reports both ends of a rename as `Any`; only the end that now exists arrived
        EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => {
            (WatchEventKind::Created, event.paths.first().filter(|p| p.is_file()))
        }
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => (WatchEventKind::Closed, event.paths.first()),
        _ => return None,
    };
    path.map(|p| WatchEvent::new(p.clone(), kind))
}

/// Check if a file should be processed (skips hidden, temporary and system files)
pub fn should_process(path: &Path) -> bool {
    let filename = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return false,
    };

    // Skip hidden files, including our own partial copies
    if filename.starts_with('.') {
        return false;
    }

    // Skip temporary files
    let temp_extensions = [".tmp", ".part", ".crdownload", ".partial", ".download", ".kiro-partial"];
    let lower = filename.to_lowercase();
    if temp_extensions.iter().any(|ext| lower.ends_with(ext)) {
        return false;
    }

    // Skip system files
    let skip_names = ["desktop.ini", "thumbs.db", ".ds_store"];
    if skip_names.iter().any(|n| filename.eq_ignore_ascii_case(n)) {
        return false;
    }

    true
}
