//! Request flows over named and ephemeral archives.
//!
//! Every operation starts from a [`RequestSlot`] taken with
//! [`ArchiveService::admit`], so saturation is rejected before any input is
//! looked at. Operations on a named archive additionally hold that name's
//! guard from [`ArchiveLocks`] until they finish (for streams: until the body
//! ends), which gives a single writer per name across create, append,
//! download-and-delete and the janitor.

mod locks;
mod name;
mod stream;

pub use locks::{ArchiveLocks, NameGuard};
pub use name::{has_zip_suffix, ArchiveName, NameError};
pub use stream::ArchiveStream;

use crate::archive::{build_in_memory, open_for_append, ArchiveError, BuildReport};
use crate::config::ZipfetchConfig;
use crate::downloader::Downloader;
use crate::fetch::CurlFetcher;
use crate::gate::{AdmissionGate, AdmissionSlot};
use anyhow::Result;
use axum::http::StatusCode;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Request-level failure taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("server is busy, try again later")]
    Busy,
    #[error("{0}")]
    InvalidInput(String),
    #[error("archive {0} does not exist")]
    NotFound(String),
    #[error("archive {0} already exists")]
    AlreadyExists(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("{0}")]
    Finalize(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::InvalidInput(_)
            | ServiceError::NotFound(_)
            | ServiceError::AlreadyExists(_) => StatusCode::BAD_REQUEST,
            ServiceError::Storage(_) | ServiceError::Finalize(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn from_archive(name: &ArchiveName, e: ArchiveError) -> Self {
        match e {
            err @ ArchiveError::Finalize(_) => ServiceError::Finalize(err.to_string()),
            ArchiveError::Io(io) if io.kind() == ErrorKind::NotFound => {
                ServiceError::NotFound(name.to_string())
            }
            other => ServiceError::Storage(format!("{}: {}", name, other)),
        }
    }
}

impl From<NameError> for ServiceError {
    fn from(e: NameError) -> Self {
        ServiceError::InvalidInput(e.to_string())
    }
}

/// Proof of admission through the request gate. Dropping it frees the slot.
#[derive(Debug)]
pub struct RequestSlot {
    _slot: AdmissionSlot,
}

/// In-memory archive for the one-shot endpoint.
#[derive(Debug)]
pub struct ZipReply {
    pub name: ArchiveName,
    pub bytes: Vec<u8>,
    pub report: BuildReport,
}

/// Outcome of an append to a named archive.
#[derive(Debug)]
pub struct AppendReply {
    pub name: ArchiveName,
    pub report: BuildReport,
}

/// Owns both gates, the downloader and the per-name locks for one storage
/// directory. Cloning shares all of them.
#[derive(Clone)]
pub struct ArchiveService {
    storage_dir: Arc<PathBuf>,
    request_gate: AdmissionGate,
    downloader: Downloader,
    locks: ArchiveLocks,
}

impl ArchiveService {
    pub fn new(storage_dir: PathBuf, request_gate: AdmissionGate, downloader: Downloader) -> Self {
        Self {
            storage_dir: Arc::new(storage_dir),
            request_gate,
            downloader,
            locks: ArchiveLocks::new(),
        }
    }

    /// Production wiring: curl fetcher, gate sizes and timeout from config.
    pub fn from_config(cfg: &ZipfetchConfig) -> Result<Self> {
        let storage_dir = cfg.resolved_storage_dir()?;
        let downloader = Downloader::new(
            AdmissionGate::new(cfg.max_concurrent_downloads),
            Arc::new(CurlFetcher),
            cfg.fetch_timeout(),
        );
        Ok(Self::new(
            storage_dir,
            AdmissionGate::new(cfg.max_concurrent_requests),
            downloader,
        ))
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn locks(&self) -> &ArchiveLocks {
        &self.locks
    }

    pub fn request_gate(&self) -> &AdmissionGate {
        &self.request_gate
    }

    /// Take a request slot or fail immediately with `Busy`.
    pub fn admit(&self) -> Result<RequestSlot, ServiceError> {
        match self.request_gate.try_acquire() {
            Ok(slot) => Ok(RequestSlot { _slot: slot }),
            Err(_) => {
                tracing::warn!(
                    capacity = self.request_gate.capacity(),
                    "request rejected: all slots busy"
                );
                Err(ServiceError::Busy)
            }
        }
    }

    fn path_of(&self, name: &ArchiveName) -> PathBuf {
        self.storage_dir.join(name.as_str())
    }

    /// Fetch `urls` and zip them in memory. Nothing touches storage.
    pub async fn fetch_and_zip(
        &self,
        _slot: RequestSlot,
        urls: Vec<String>,
        filename: Option<&str>,
    ) -> Result<ZipReply, ServiceError> {
        if urls.is_empty() {
            return Err(ServiceError::InvalidInput("urls must not be empty".to_string()));
        }
        let name = match filename {
            Some(raw) if !raw.trim().is_empty() => ArchiveName::parse(raw)?,
            _ => ArchiveName::timestamped(),
        };

        let results = self.downloader.fetch_all(&urls).await;
        let (bytes, report) = tokio::task::spawn_blocking(move || build_in_memory(&results))
            .await
            .map_err(|e| ServiceError::Finalize(e.to_string()))?
            .map_err(|e| ServiceError::from_archive(&name, e))?;

        tracing::info!(
            archive = %name,
            added = report.added,
            failed = report.errors.len(),
            size = bytes.len(),
            "built in-memory archive"
        );
        Ok(ZipReply {
            name,
            bytes,
            report,
        })
    }

    /// Create an empty archive file. Never overwrites.
    pub async fn create(&self, _slot: RequestSlot, filename: &str) -> Result<ArchiveName, ServiceError> {
        let name = ArchiveName::parse(filename)?;
        let _guard = self.locks.lock(name.as_str()).await;
        let path = self.path_of(&name);

        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(_) => {
                tracing::info!(archive = %name, "archive created");
                Ok(name)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(ServiceError::AlreadyExists(name.to_string()))
            }
            Err(e) => Err(ServiceError::Storage(format!(
                "failed to create {}: {}",
                name, e
            ))),
        }
    }

    /// Fetch `urls` into an existing archive file. Earlier entries are kept.
    pub async fn append(
        &self,
        _slot: RequestSlot,
        filename: &str,
        urls: Vec<String>,
    ) -> Result<AppendReply, ServiceError> {
        let name = ArchiveName::parse(filename)?;
        if urls.is_empty() {
            return Err(ServiceError::InvalidInput("urls must not be empty".to_string()));
        }
        let _guard = self.locks.lock(name.as_str()).await;
        let path = self.path_of(&name);

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(ServiceError::NotFound(name.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ServiceError::NotFound(name.to_string()))
            }
            Err(e) => return Err(ServiceError::Storage(format!("{}: {}", name, e))),
        }

        // Open before fetching so an unreadable file costs no downloads.
        let builder = tokio::task::spawn_blocking(move || open_for_append(&path))
            .await
            .map_err(|e| ServiceError::Storage(e.to_string()))?
            .map_err(|e| ServiceError::from_archive(&name, e))?;

        let results = self.downloader.fetch_all(&urls).await;

        let report = tokio::task::spawn_blocking(move || {
            let mut builder = builder;
            builder.add_results(&results);
            let (file, report) = builder.finish()?;
            file.sync_all()?;
            Ok::<_, ArchiveError>(report)
        })
        .await
        .map_err(|e| ServiceError::Finalize(e.to_string()))?
        .map_err(|e| ServiceError::from_archive(&name, e))?;

        tracing::info!(
            archive = %name,
            added = report.added,
            failed = report.errors.len(),
            "appended to archive"
        );
        Ok(AppendReply { name, report })
    }

    /// Open a named archive for streaming.
    pub async fn stream(&self, slot: RequestSlot, filename: &str) -> Result<ArchiveStream, ServiceError> {
        self.open_stream(slot, filename, false).await
    }

    /// Like [`stream`](Self::stream), then delete the file once every byte
    /// has been read. An interrupted or dropped stream leaves the file.
    pub async fn stream_and_delete(
        &self,
        slot: RequestSlot,
        filename: &str,
    ) -> Result<ArchiveStream, ServiceError> {
        self.open_stream(slot, filename, true).await
    }

    async fn open_stream(
        &self,
        slot: RequestSlot,
        filename: &str,
        delete_after: bool,
    ) -> Result<ArchiveStream, ServiceError> {
        let name = ArchiveName::parse(filename)?;
        let guard = self.locks.lock(name.as_str()).await;
        let path = self.path_of(&name);

        let file = match tokio::fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ServiceError::NotFound(name.to_string()))
            }
            Err(e) => return Err(ServiceError::Storage(format!("{}: {}", name, e))),
        };
        let meta = file
            .metadata()
            .await
            .map_err(|e| ServiceError::Storage(format!("failed to stat {}: {}", name, e)))?;
        if !meta.is_file() {
            return Err(ServiceError::NotFound(name.to_string()));
        }

        tracing::debug!(archive = %name, len = meta.len(), delete_after, "streaming archive");
        Ok(stream::open(
            name,
            path,
            file,
            meta.len(),
            delete_after,
            guard,
            slot,
        ))
    }
}
