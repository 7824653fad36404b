//! Remote GET capability.
//!
//! The downloader only talks to the network through [`Fetcher`], so tests can
//! substitute canned or delayed responses. [`CurlFetcher`] is the libcurl
//! implementation used by the server.

mod curl_fetcher;
mod parse;

pub use curl_fetcher::CurlFetcher;

use std::time::Duration;

/// A completed GET: final status, content-type and the whole body.
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    pub status: u32,
    /// Reason phrase from the final status line, when the server sent one.
    pub reason: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// `"404 Not Found"`, or just `"404"` without a reason phrase.
    pub fn status_text(&self) -> String {
        match &self.reason {
            Some(reason) if !reason.is_empty() => format!("{} {}", self.status, reason),
            _ => self.status.to_string(),
        }
    }
}

/// Why a GET produced no response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    /// Connection, DNS, TLS, timeout or protocol failure.
    #[error("{0}")]
    Transport(String),
    /// The response started but its body could not be read to the end.
    #[error("{0}")]
    Read(String),
}

/// Blocking HTTP GET. Called from `spawn_blocking`, one call per URL.
pub trait Fetcher: Send + Sync + 'static {
    fn get(&self, url: &str, timeout: Duration) -> Result<FetchResponse, FetchFailure>;
}

#[cfg(test)]
pub(crate) mod mock;
