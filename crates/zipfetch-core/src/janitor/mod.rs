//! Periodic removal of stale archive files.
//!
//! Each cycle lists the storage directory once and deletes every `.zip`
//! file (case-insensitive) whose modification time is strictly older than
//! the retention window. Names currently held by a request are skipped and
//! retried next cycle. Staleness is checked again under the name's guard
//! before deleting. Listing and stat errors are logged; the cycle goes
//! on. The loop runs until its `CancellationToken` is cancelled.

mod target;

pub use target::{Clock, DirTarget, EntryMeta, Listing, SweepTarget, SystemClock};

use crate::config::JanitorConfig;
use crate::lifecycle::{has_zip_suffix, ArchiveLocks};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// What one cycle did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: Vec<String>,
    pub skipped_busy: Vec<String>,
    pub errors: Vec<String>,
}

/// True when `modified` is strictly more than `retention` before `now`.
/// Modification times in the future are never stale.
pub fn is_stale(now: SystemTime, modified: SystemTime, retention: Duration) -> bool {
    match now.duration_since(modified) {
        Ok(age) => age > retention,
        Err(_) => false,
    }
}

#[derive(Clone)]
pub struct Janitor {
    target: Arc<dyn SweepTarget>,
    clock: Arc<dyn Clock>,
    locks: ArchiveLocks,
    retention: Duration,
    interval: Duration,
}

impl Janitor {
    pub fn new(
        target: Arc<dyn SweepTarget>,
        clock: Arc<dyn Clock>,
        locks: ArchiveLocks,
        retention: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            target,
            clock,
            locks,
            retention,
            interval,
        }
    }

    /// Janitor over a storage directory with the system clock.
    pub fn for_dir(dir: impl Into<PathBuf>, locks: ArchiveLocks, cfg: &JanitorConfig) -> Self {
        Self::new(
            Arc::new(DirTarget::new(dir)),
            Arc::new(SystemClock),
            locks,
            cfg.retention(),
            cfg.interval(),
        )
    }

    /// One pass over the target. Blocking; never fails as a whole except
    /// when the listing itself fails, which is reported in `errors`.
    pub fn sweep_once(&self) -> SweepReport {
        let mut report = SweepReport::default();
        let listing = match self.target.list() {
            Ok(l) => l,
            Err(e) => {
                tracing::warn!("janitor: failed to list storage: {}", e);
                report.errors.push(format!("list: {}", e));
                return report;
            }
        };

        let now = self.clock.now();
        for Listing { name, meta } in listing {
            if !has_zip_suffix(&name) {
                continue;
            }
            let meta = match meta {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(file = %name, "janitor: failed to stat: {}", e);
                    report.errors.push(format!("{}: {}", name, e));
                    continue;
                }
            };
            if meta.is_dir || !is_stale(now, meta.modified, self.retention) {
                continue;
            }

            let Some(_guard) = self.locks.try_lock(&name) else {
                tracing::debug!(file = %name, "janitor: archive in use, skipping");
                report.skipped_busy.push(name);
                continue;
            };
            // The listing may predate an append or a re-create that
            // finished before the guard was taken.
            match self.target.stat(&name) {
                Ok(fresh)
                    if !fresh.is_dir
                        && is_stale(self.clock.now(), fresh.modified, self.retention) => {}
                Ok(_) => {
                    tracing::debug!(file = %name, "janitor: archive changed since listing, keeping");
                    continue;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    tracing::warn!(file = %name, "janitor: failed to stat: {}", e);
                    report.errors.push(format!("{}: {}", name, e));
                    continue;
                }
            }
            match self.target.remove(&name) {
                Ok(()) => {
                    tracing::info!(file = %name, "janitor: removed stale archive");
                    report.removed.push(name);
                }
                Err(e) => {
                    tracing::warn!(file = %name, "janitor: failed to remove: {}", e);
                    report.errors.push(format!("{}: {}", name, e));
                }
            }
        }
        report
    }

    /// Sweep, then sleep `interval`, until `shutdown` is cancelled. The first
    /// sweep happens immediately.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            retention_secs = self.retention.as_secs(),
            interval_secs = self.interval.as_secs(),
            "janitor starting"
        );
        loop {
            let this = self.clone();
            match tokio::task::spawn_blocking(move || this.sweep_once()).await {
                Ok(report) if !report.removed.is_empty() || !report.errors.is_empty() => {
                    tracing::debug!(
                        removed = report.removed.len(),
                        skipped = report.skipped_busy.len(),
                        errors = report.errors.len(),
                        "janitor cycle finished"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("janitor cycle panicked: {}", e),
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!("janitor shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    /// Run on the current runtime; stop with [`JanitorHandle::stop`].
    pub fn spawn(self) -> JanitorHandle {
        let token = CancellationToken::new();
        let task = tokio::spawn(self.run(token.clone()));
        JanitorHandle { token, task }
    }
}

/// Owner of a running janitor task.
pub struct JanitorHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl JanitorHandle {
    /// Cancel the loop and wait for it to exit. A sweep in progress finishes
    /// first.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!("janitor task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
