// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! No-clobber file relocation
//!
//! The destination is always published with `hard_link`, which fails with
//! `AlreadyExists` instead of replacing an existing file. When linking the
//! source is impossible (different device, filesystem without links) the data
//! is first copied to a hidden partial file next to the destination, and that
//! partial file is linked into place. Either way the source is only unlinked
//! after the destination is complete, and a failed source unlink undoes the
//! publish so the file never ends up in both places or in neither.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Why a transfer did not happen
#[derive(Debug)]
pub enum TransferError {
    /// Something already occupies the destination name
    DestinationTaken,
    /// The source vanished
    SourceGone,
    /// Any other I/O failure; the source is untouched
    Io(io::Error),
}

/// Move `src` to `dest`, never replacing an existing `dest`
pub fn move_no_clobber(src: &Path, dest: &Path) -> Result<(), TransferError> {
    match fs::hard_link(src, dest) {
        Ok(()) => release_source(src, dest),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(TransferError::DestinationTaken),
        Err(e) if e.kind() == ErrorKind::NotFound && !src.exists() => Err(TransferError::SourceGone),
        Err(e) => {
            debug!("Hard link {:?} -> {:?} failed ({}), copying instead", src, dest, e);
            copy_then_publish(src, dest)
        }
    }
}

/// Copy into a partial file beside `dest`, then publish it under the final name
pub(crate) fn copy_then_publish(src: &Path, dest: &Path) -> Result<(), TransferError> {
    let partial = partial_path(dest);

    let result = copy_to_partial(src, &partial).and_then(|()| publish(&partial, dest));
    if result.is_err() {
        let _ = fs::remove_file(&partial);
        return result;
    }

    release_source(src, dest)
}

fn copy_to_partial(src: &Path, partial: &Path) -> Result<(), TransferError> {
    let modified = match fs::metadata(src) {
        Ok(meta) => meta.modified().ok(),
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(TransferError::SourceGone),
        Err(e) => return Err(TransferError::Io(e)),
    };

    match fs::copy(src, partial) {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound && !src.exists() => return Err(TransferError::SourceGone),
        Err(e) => return Err(TransferError::Io(e)),
    }

    let file = OpenOptions::new().write(true).open(partial).map_err(TransferError::Io)?;
    if let Some(time) = modified {
        file.set_modified(time).map_err(TransferError::Io)?;
    }
    file.sync_all().map_err(TransferError::Io)
}

fn publish(partial: &Path, dest: &Path) -> Result<(), TransferError> {
    match fs::hard_link(partial, dest) {
        Ok(()) => {
            let _ = fs::remove_file(partial);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(TransferError::DestinationTaken),
        Err(e) => {
            // No link support on this filesystem: rename is the best remaining option
            debug!("Hard link unsupported at {:?} ({}), renaming partial", dest, e);
            if fs::symlink_metadata(dest).is_ok() {
                return Err(TransferError::DestinationTaken);
            }
            fs::rename(partial, dest).map_err(TransferError::Io)
        }
    }
}

/// Unlink the source once `dest` holds the data; roll back on failure
fn release_source(src: &Path, dest: &Path) -> Result<(), TransferError> {
    match fs::remove_file(src) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => {
            if let Err(undo) = fs::remove_file(dest) {
                warn!("Could not roll back {:?} after failed move: {}", dest, undo);
            }
            Err(TransferError::Io(e))
        }
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(dest.file_name().unwrap_or_default());
    name.push(".kiro-partial");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_into_free_name() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.png");
        let dest = dir.path().join("b.png");
        fs::write(&src, b"pixels").unwrap();

        move_no_clobber(&src, &dest).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"pixels");
    }

    #[test]
    fn refuses_to_replace_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.png");
        let dest = dir.path().join("b.png");
        fs::write(&src, b"new").unwrap();
        fs::write(&dest, b"old").unwrap();

        assert!(matches!(move_no_clobber(&src, &dest), Err(TransferError::DestinationTaken)));
        assert_eq!(fs::read(&src).unwrap(), b"new");
        assert_eq!(fs::read(&dest).unwrap(), b"old");
    }

    #[test]
    fn missing_source_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = move_no_clobber(&dir.path().join("gone.png"), &dir.path().join("b.png"));
        assert!(matches!(result, Err(TransferError::SourceGone)));
        assert!(!dir.path().join("b.png").exists());
    }

    #[test]
    fn copy_path_leaves_no_partial_behind() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.png");
        let dest = dir.path().join("out").join("a.png");
        fs::create_dir_all(dest.parent().unwrap()).unwrap();
        fs::write(&src, b"pixels").unwrap();

        copy_then_publish(&src, &dest).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"pixels");
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn copy_path_keeps_modification_time() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.png");
        let dest = dir.path().join("b.png");
        fs::write(&src, b"pixels").unwrap();
        let mtime = filetime::FileTime::from_unix_time(1_747_224_000, 0);
        filetime::set_file_mtime(&src, mtime).unwrap();

        copy_then_publish(&src, &dest).unwrap();
        let meta = fs::metadata(&dest).unwrap();
        assert_eq!(filetime::FileTime::from_last_modification_time(&meta).unix_seconds(), mtime.unix_seconds());
    }

    #[test]
    fn copy_path_refuses_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.png");
        let dest = dir.path().join("b.png");
        fs::write(&src, b"new").unwrap();
        fs::write(&dest, b"old").unwrap();

        assert!(matches!(copy_then_publish(&src, &dest), Err(TransferError::DestinationTaken)));
        assert_eq!(fs::read(&src).unwrap(), b"new");
        assert_eq!(fs::read(&dest).unwrap(), b"old");
        assert!(!partial_path(&dest).exists());
    }

    #[cfg(unix)]
    #[test]
    fn undeletable_source_rolls_back_destination() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        let src = locked.join("a.png");
        fs::write(&src, b"pixels").unwrap();
        let linked = dir.path().join("linked.png");
        let copied = dir.path().join("copied.png");

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
        // Root ignores directory permissions, so the unlink cannot be made to fail
        let privileged = fs::write(locked.join("canary"), b"").is_ok();

        let via_link = move_no_clobber(&src, &linked);
        let via_copy = copy_then_publish(&src, &copied);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if privileged {
            return;
        }

        assert!(matches!(via_link, Err(TransferError::Io(_))));
        assert!(matches!(via_copy, Err(TransferError::Io(_))));
        assert_eq!(fs::read(&src).unwrap(), b"pixels");
        assert!(!linked.exists());
        assert!(!copied.exists());
        assert!(!partial_path(&copied).exists());
    }

    #[test]
    fn partial_name_is_hidden() {
        let partial = partial_path(Path::new("/a/2025-05/shot.png"));
        assert_eq!(partial, PathBuf::from("/a/2025-05/.shot.png.kiro-partial"));
    }
}
