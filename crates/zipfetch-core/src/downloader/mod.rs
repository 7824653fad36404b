//! Fan-out/join fetch of a URL batch.
//!
//! Every URL gets its own task; each task takes one slot from the shared
//! download gate before touching the network, so the total number of
//! in-flight fetches stays bounded across all concurrent batches. The call
//! returns once every item is terminal, with results in input order.

mod item;

use crate::fetch::Fetcher;
use crate::gate::AdmissionGate;
use std::sync::Arc;
use std::time::Duration;

/// Per-item failure. Recorded in the batch result, never aborts the batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    #[error("invalid URL")]
    InvalidUrl,
    /// Transport failure or non-200 status; the message carries which.
    #[error("{0}")]
    FetchFailed(String),
    #[error("failed to read content: {0}")]
    ReadFailed(String),
}

/// Outcome for one URL of a batch.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub url: String,
    /// Sanitized entry name; empty when the item failed.
    pub filename: String,
    pub outcome: Result<Vec<u8>, ItemError>,
}

impl DownloadResult {
    pub(crate) fn failed(url: impl Into<String>, error: ItemError) -> Self {
        Self {
            url: url.into(),
            filename: String::new(),
            outcome: Err(error),
        }
    }

    pub fn content(&self) -> Option<&[u8]> {
        self.outcome.as_deref().ok()
    }

    pub fn error(&self) -> Option<&ItemError> {
        self.outcome.as_ref().err()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Batch fetcher bound to a download gate and a [`Fetcher`].
#[derive(Clone)]
pub struct Downloader {
    gate: AdmissionGate,
    fetcher: Arc<dyn Fetcher>,
    timeout: Duration,
}

impl Downloader {
    pub fn new(gate: AdmissionGate, fetcher: Arc<dyn Fetcher>, timeout: Duration) -> Self {
        Self {
            gate,
            fetcher,
            timeout,
        }
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// Fetches all `urls` concurrently and returns one result per URL, in
    /// the same order. No cancellation: a slow item holds the batch until its
    /// own timeout.
    pub async fn fetch_all(&self, urls: &[String]) -> Vec<DownloadResult> {
        // handles[i] is the only writer of result slot i.
        let handles: Vec<_> = urls
            .iter()
            .enumerate()
            .map(|(index, url)| {
                let gate = self.gate.clone();
                let fetcher = Arc::clone(&self.fetcher);
                let url = url.clone();
                let timeout = self.timeout;
                tokio::spawn(async move {
                    let _slot = match gate.acquire().await {
                        Ok(slot) => slot,
                        Err(e) => {
                            return DownloadResult::failed(
                                url.as_str(),
                                ItemError::FetchFailed(format!("download failed: {}", e)),
                            )
                        }
                    };
                    item::fetch_item(fetcher, index, url, timeout).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (handle, url) in handles.into_iter().zip(urls) {
            let result = handle.await.unwrap_or_else(|e| {
                tracing::warn!(url = %url, "download task failed: {}", e);
                DownloadResult::failed(
                    url.as_str(),
                    ItemError::FetchFailed(format!("download failed: {}", e)),
                )
            });
            results.push(result);
        }

        let failed = results.iter().filter(|r| !r.is_success()).count();
        tracing::debug!(total = results.len(), failed, "batch fetch finished");
        results
    }
}

#[cfg(test)]
mod tests;
