//! Single-URL pipeline: validate, GET, check status, name the entry.

use super::{DownloadResult, ItemError};
use crate::fetch::{FetchFailure, Fetcher};
use crate::url_model::derive_filename;
use std::sync::Arc;
use std::time::Duration;

/// Any well-formed absolute URL passes. Schemes the fetcher cannot speak
/// fail later, as fetch errors.
pub(super) fn is_valid_url(raw: &str) -> bool {
    url::Url::parse(raw).is_ok()
}

pub(super) async fn fetch_item(
    fetcher: Arc<dyn Fetcher>,
    index: usize,
    url: String,
    timeout: Duration,
) -> DownloadResult {
    if !is_valid_url(&url) {
        tracing::debug!(url = %url, "rejected invalid URL");
        return DownloadResult::failed(url, ItemError::InvalidUrl);
    }

    let target = url.clone();
    let fetched = tokio::task::spawn_blocking(move || fetcher.get(&target, timeout)).await;

    let response = match fetched {
        Ok(Ok(response)) => response,
        Ok(Err(FetchFailure::Transport(msg))) => {
            tracing::debug!(url = %url, "fetch failed: {}", msg);
            return DownloadResult::failed(
                url,
                ItemError::FetchFailed(format!("download failed: {}", msg)),
            );
        }
        Ok(Err(FetchFailure::Read(msg))) => {
            tracing::debug!(url = %url, "body read failed: {}", msg);
            return DownloadResult::failed(url, ItemError::ReadFailed(msg));
        }
        Err(e) => {
            return DownloadResult::failed(
                url,
                ItemError::FetchFailed(format!("download failed: {}", e)),
            );
        }
    };

    if response.status != 200 {
        tracing::debug!(url = %url, status = response.status, "non-OK status");
        return DownloadResult::failed(
            url,
            ItemError::FetchFailed(format!("server returned: {}", response.status_text())),
        );
    }

    let filename = derive_filename(&url, index, response.content_type.as_deref());
    DownloadResult {
        url,
        filename,
        outcome: Ok(response.body),
    }
}
