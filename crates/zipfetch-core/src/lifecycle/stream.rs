//! Chunked streaming of an archive file, with optional delete on completion.

use super::locks::NameGuard;
use super::{ArchiveName, RequestSlot};
use bytes::{Bytes, BytesMut};
use futures_util::stream::{self, BoxStream, StreamExt};
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

const CHUNK: usize = 64 * 1024;

/// An open archive ready to be sent. The body holds the name guard and the
/// request slot until it ends or is dropped.
pub struct ArchiveStream {
    pub name: ArchiveName,
    pub len: u64,
    pub body: BoxStream<'static, std::io::Result<Bytes>>,
}

impl std::fmt::Debug for ArchiveStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveStream")
            .field("name", &self.name)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

struct Transfer {
    file: File,
    buf: BytesMut,
    path: PathBuf,
    len: u64,
    sent: u64,
    delete_after: bool,
    _guard: NameGuard,
    _slot: RequestSlot,
}

impl Transfer {
    async fn next_chunk(mut self) -> Option<(std::io::Result<Bytes>, Option<Self>)> {
        if self.sent >= self.len {
            return None;
        }
        self.buf.reserve(CHUNK);
        match self.file.read_buf(&mut self.buf).await {
            // Shorter than at open time; treated as interrupted.
            Ok(0) => None,
            Ok(n) => {
                self.sent += n as u64;
                let chunk = self.buf.split().freeze();
                Some((Ok(chunk), Some(self)))
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), sent = self.sent, "archive stream read failed: {}", e);
                Some((Err(e), None))
            }
        }
    }
}

// The HTTP layer stops polling once `len` bytes are handed over, so
// completion is decided here by byte count, not by reaching EOF. Runs
// before the name guard is released.
impl Drop for Transfer {
    fn drop(&mut self) {
        if self.sent < self.len {
            tracing::warn!(
                path = %self.path.display(),
                sent = self.sent,
                len = self.len,
                "archive stream interrupted, file kept"
            );
            return;
        }
        tracing::debug!(path = %self.path.display(), bytes = self.sent, "archive streamed");
        if !self.delete_after {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::info!(path = %self.path.display(), "archive deleted after download"),
            Err(e) => tracing::warn!(path = %self.path.display(), "failed to delete archive: {}", e),
        }
    }
}

pub(super) fn open(
    name: ArchiveName,
    path: PathBuf,
    file: File,
    len: u64,
    delete_after: bool,
    guard: NameGuard,
    slot: RequestSlot,
) -> ArchiveStream {
    let transfer = Transfer {
        file,
        buf: BytesMut::with_capacity(CHUNK),
        path,
        len,
        sent: 0,
        delete_after,
        _guard: guard,
        _slot: slot,
    };
    let body = stream::unfold(Some(transfer), |state| async move {
        match state {
            Some(transfer) => transfer.next_chunk().await,
            None => None,
        }
    })
    .boxed();
    ArchiveStream { name, len, body }
}
