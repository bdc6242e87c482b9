// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use kiro::archive::ArchiveMover;
use kiro::classifier::{classify, Classification};
use kiro::clock::Clock;
use kiro::organizer::{Organizer, Outcome};
use kiro::paths::ResolvedPaths;
use kiro::watcher::{WatchEvent, WatchEventKind};
use kiro::{AppConfig, KiroError};

/// Frozen at 2025-06-02 18:45:09; sleeping returns at once
struct FrozenClock;

#[async_trait]
impl Clock for FrozenClock {
    fn now(&self) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 2, 18, 45, 9).unwrap()
    }

    async fn sleep(&self, _duration: Duration) {}
}

fn modified_may_14(path: &Path) {
    let t = Local.with_ymd_and_hms(2025, 5, 14, 12, 0, 0).unwrap();
    set_file_mtime(path, FileTime::from_unix_time(t.timestamp(), 0)).unwrap();
}

fn write_shot(dir: &Path, name: &str, body: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    modified_may_14(&path);
    path
}

#[test]
fn empty_destination_keeps_the_name() {
    let desk = tempfile::tempdir().unwrap();
    let archive = tempfile::tempdir().unwrap();
    let src = write_shot(desk.path(), "Screenshot_test.png", b"png");

    let dest = ArchiveMover::new(archive.path(), Arc::new(FrozenClock)).archive(&src).unwrap();

    assert_eq!(dest, archive.path().join("Screenshots/2025-05/Screenshot_test.png"));
}

#[test]
fn occupied_destination_gets_a_timestamped_name() {
    let desk = tempfile::tempdir().unwrap();
    let archive = tempfile::tempdir().unwrap();
    let month = archive.path().join("Screenshots/2025-05");
    fs::create_dir_all(&month).unwrap();
    fs::write(month.join("Screenshot_test.png"), b"first").unwrap();
    let src = write_shot(desk.path(), "Screenshot_test.png", b"second");

    let dest = ArchiveMover::new(archive.path(), Arc::new(FrozenClock)).archive(&src).unwrap();

    assert_eq!(dest, month.join("Screenshot_test_20250602_184509.png"));
    assert_eq!(fs::read(month.join("Screenshot_test.png")).unwrap(), b"first");
    assert_eq!(fs::read(&dest).unwrap(), b"second");
}

#[test]
fn many_identical_names_never_overwrite() {
    let archive = tempfile::tempdir().unwrap();
    let mover = ArchiveMover::new(archive.path(), Arc::new(FrozenClock));

    let mut dests = Vec::new();
    for i in 0..12u8 {
        let desk = tempfile::tempdir().unwrap();
        let src = write_shot(desk.path(), "Screenshot.png", &[i]);
        dests.push(mover.archive(&src).unwrap());
    }

    let mut unique = dests.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 12);
    for (i, dest) in dests.iter().enumerate() {
        assert_eq!(fs::read(dest).unwrap(), vec![i as u8]);
    }
}

#[test]
fn rearchiving_a_moved_file_is_source_unavailable() {
    let desk = tempfile::tempdir().unwrap();
    let archive = tempfile::tempdir().unwrap();
    let src = write_shot(desk.path(), "Screenshot_test.png", b"png");
    let mover = ArchiveMover::new(archive.path(), Arc::new(FrozenClock));

    let dest = mover.archive(&src).unwrap();
    let again = mover.archive(&src);

    assert!(matches!(again, Err(KiroError::SourceUnavailable(_))));
    assert_eq!(fs::read(&dest).unwrap(), b"png");
    assert_eq!(fs::read_dir(dest.parent().unwrap()).unwrap().count(), 1);
}

#[test]
fn classification_is_case_insensitive() {
    assert_eq!(classify("SCREENSHOT.png"), classify("screenshot.png"));
    assert_eq!(classify("SCREENSHOT.png"), Classification::Screenshot);
    assert_eq!(classify("notes.png"), Classification::Ignore);
}

#[test]
fn watch_event_flows_through_to_the_archive() {
    let root = tempfile::tempdir().unwrap();
    let paths = ResolvedPaths {
        source: root.path().join("Desktop"),
        archive_root: root.path().join("Archive"),
    };
    fs::create_dir_all(&paths.source).unwrap();
    let src = write_shot(&paths.source, "Captura de pantalla.png", b"png");

    let mut organizer = Organizer::new(&paths, &AppConfig::default(), Arc::new(FrozenClock));
    let event = WatchEvent::new(src.clone(), WatchEventKind::Closed);
    let outcome = tokio_test::block_on(organizer.handle(&event));

    match outcome {
        Outcome::Archived(dest) => {
            assert_eq!(dest, paths.archive_root.join("Screenshots/2025-05/Captura de pantalla.png"));
        }
        other => panic!("expected Archived, got {:?}", other),
    }
    assert!(!src.exists());
}
