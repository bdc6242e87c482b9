// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Source and archive directory resolution

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{AppConfig, KiroError, Result};

/// Folder created under the documents directory when no archive root is configured
pub const DEFAULT_ARCHIVE_DIR: &str = "Kiro_Archive";

/// Directories a run operates on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub source: PathBuf,
    pub archive_root: PathBuf,
}

/// Platform lookups, captured once so resolution is testable
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    home: Option<PathBuf>,
    desktop: Option<PathBuf>,
    documents: Option<PathBuf>,
}

impl PathResolver {
    /// Query the platform for home, Desktop and Documents
    pub fn from_env() -> Self {
        Self {
            home: dirs::home_dir(),
            desktop: dirs::desktop_dir(),
            documents: dirs::document_dir(),
        }
    }

    /// Resolver rooted at an arbitrary home directory, without platform overrides
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: Some(home.into()),
            desktop: None,
            documents: None,
        }
    }

    /// Resolve both directories. CLI overrides beat config values, which beat platform defaults.
    pub fn resolve(
        &self,
        config: &AppConfig,
        source_override: Option<&Path>,
        target_override: Option<&Path>,
    ) -> Result<ResolvedPaths> {
        let source = match source_override.or(config.source_dir.as_deref()) {
            Some(p) => p.to_path_buf(),
            None => self.desktop_dir()?,
        };
        let archive_root = match target_override.or(config.archive_root.as_deref()) {
            Some(p) => p.to_path_buf(),
            None => self.default_archive_root()?,
        };
        Ok(ResolvedPaths { source, archive_root })
    }

    /// Find the real Desktop, preferring the OneDrive-redirected one
    pub fn desktop_dir(&self) -> Result<PathBuf> {
        if let Some(home) = &self.home {
            let onedrive = home.join("OneDrive").join("Desktop");
            if onedrive.is_dir() {
                debug!("Using OneDrive Desktop: {:?}", onedrive);
                return Ok(onedrive);
            }
        }

        if let Some(desktop) = self.desktop.as_ref().filter(|d| d.is_dir()) {
            return Ok(desktop.clone());
        }

        match &self.home {
            Some(home) => {
                let fallback = home.join("Desktop");
                if !fallback.is_dir() {
                    warn!("Could not locate a Desktop folder, falling back to {:?}", fallback);
                }
                Ok(fallback)
            }
            None => self
                .desktop
                .clone()
                .ok_or_else(|| KiroError::PathResolution("no home or Desktop directory available".to_string())),
        }
    }

    /// ~/Documents/Kiro_Archive
    pub fn default_archive_root(&self) -> Result<PathBuf> {
        let documents = self
            .documents
            .clone()
            .or_else(|| self.home.as_ref().map(|h| h.join("Documents")))
            .ok_or_else(|| KiroError::PathResolution("no home or Documents directory available".to_string()))?;
        Ok(documents.join(DEFAULT_ARCHIVE_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onedrive_desktop_wins_when_present() {
        let home = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(home.path().join("OneDrive/Desktop")).unwrap();
        std::fs::create_dir_all(home.path().join("Desktop")).unwrap();

        let resolver = PathResolver::with_home(home.path());
        assert_eq!(resolver.desktop_dir().unwrap(), home.path().join("OneDrive").join("Desktop"));
    }

    #[test]
    fn plain_desktop_otherwise() {
        let home = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(home.path().join("Desktop")).unwrap();

        let resolver = PathResolver::with_home(home.path());
        assert_eq!(resolver.desktop_dir().unwrap(), home.path().join("Desktop"));
    }

    #[test]
    fn missing_desktop_falls_back_without_failing() {
        let home = tempfile::tempdir().unwrap();
        let resolver = PathResolver::with_home(home.path());
        assert_eq!(resolver.desktop_dir().unwrap(), home.path().join("Desktop"));
    }

    #[test]
    fn no_home_is_a_resolution_error() {
        let resolver = PathResolver::default();
        assert!(matches!(resolver.desktop_dir(), Err(KiroError::PathResolution(_))));
        assert!(matches!(
            resolver.resolve(&AppConfig::default(), None, None),
            Err(KiroError::PathResolution(_))
        ));
    }

    #[test]
    fn explicit_paths_need_no_home() {
        let resolver = PathResolver::default();
        let resolved = resolver
            .resolve(&AppConfig::default(), Some(Path::new("/in")), Some(Path::new("/out")))
            .unwrap();
        assert_eq!(resolved.source, PathBuf::from("/in"));
        assert_eq!(resolved.archive_root, PathBuf::from("/out"));
    }

    #[test]
    fn overrides_beat_config() {
        let home = tempfile::tempdir().unwrap();
        let resolver = PathResolver::with_home(home.path());
        let mut config = AppConfig::default();
        config.source_dir = Some(PathBuf::from("/from/config"));
        config.archive_root = Some(PathBuf::from("/archive/config"));

        let resolved = resolver.resolve(&config, Some(Path::new("/cli")), None).unwrap();
        assert_eq!(resolved.source, PathBuf::from("/cli"));
        assert_eq!(resolved.archive_root, PathBuf::from("/archive/config"));
    }

    #[test]
    fn default_archive_root_is_under_documents() {
        let home = tempfile::tempdir().unwrap();
        let resolver = PathResolver::with_home(home.path());
        assert_eq!(
            resolver.default_archive_root().unwrap(),
            home.path().join("Documents").join(DEFAULT_ARCHIVE_DIR)
        );
    }
}
