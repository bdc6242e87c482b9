// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Kiro: The Automated Screenshot Organizer
//!
//! Watches the Desktop for new screenshots and files them under
//! `<archive_root>/Screenshots/<YYYY-MM>/`, never overwriting anything.

pub mod archive;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod organizer;
pub mod paths;
pub mod stability;
pub mod watcher;

pub use config::AppConfig;
pub use error::{KiroError, Result};
