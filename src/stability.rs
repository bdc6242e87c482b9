// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Wait for a freshly created file to stop changing

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::StabilityConfig;
use crate::{KiroError, Result};

/// Size and mtime at one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Probe {
    len: u64,
    modified: Option<SystemTime>,
}

/// Bounded polling until two consecutive probes agree
pub struct StabilityWaiter {
    poll_interval: Duration,
    timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl StabilityWaiter {
    pub fn new(poll_interval: Duration, timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            poll_interval,
            timeout,
            clock,
        }
    }

    pub fn from_config(config: &StabilityConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(config.poll_interval(), config.timeout(), clock)
    }

    /// Returns once the file has settled with a non-zero size.
    ///
    /// Fails with `SourceUnavailable` if the file disappears and with
    /// `FileNotStable` once the timeout has elapsed.
    pub async fn wait(&self, path: &Path) -> Result<()> {
        let start = self.clock.now();
        let mut last = probe(path)?;

        loop {
            self.clock.sleep(self.poll_interval).await;

            let current = probe(path)?;
            if current == last && current.len > 0 {
                return Ok(());
            }

            let elapsed = (self.clock.now() - start).to_std().unwrap_or_default();
            if elapsed >= self.timeout {
                warn!("File stability check timed out for {:?}", path);
                return Err(KiroError::FileNotStable(path.to_path_buf()));
            }

            debug!("File {:?} still being written, size: {}", path, current.len);
            last = current;
        }
    }
}

fn probe(path: &Path) -> Result<Probe> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Probe {
            len: meta.len(),
            modified: meta.modified().ok(),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(KiroError::SourceUnavailable(path.to_path_buf())),
        Err(e) => Err(e.into()),
    }
}
