//! libcurl-backed GET: redirects followed, proxies disabled, hard timeout.

use super::parse::final_reason_phrase;
use super::{FetchFailure, FetchResponse, Fetcher};
use std::time::Duration;

/// Production [`Fetcher`]. Stateless; a fresh Easy handle per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlFetcher;

impl Fetcher for CurlFetcher {
    fn get(&self, url: &str, timeout: Duration) -> Result<FetchResponse, FetchFailure> {
        check_scheme(url)?;
        let mut headers: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(transport)?;
        easy.get(true).map_err(transport)?;
        easy.follow_location(true).map_err(transport)?;
        easy.max_redirections(10).map_err(transport)?;
        // Never route through a proxy, whatever the environment says.
        easy.noproxy("*").map_err(transport)?;
        easy.timeout(timeout).map_err(transport)?;

        {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    headers.push(String::from_utf8_lossy(data).trim_end().to_string());
                    true
                })
                .map_err(transport)?;
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(transport)?;
            transfer.perform().map_err(classify)?;
        }

        let status = easy.response_code().map_err(transport)?;
        let content_type = easy
            .content_type()
            .map_err(transport)?
            .map(|s| s.to_string());

        Ok(FetchResponse {
            status,
            reason: final_reason_phrase(&headers),
            content_type,
            body,
        })
    }
}

/// libcurl would happily read `file://` or talk FTP; only HTTP is fetched.
fn check_scheme(url: &str) -> Result<(), FetchFailure> {
    let parsed = url::Url::parse(url).map_err(|e| FetchFailure::Transport(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(FetchFailure::Transport(format!(
            "unsupported protocol scheme \"{}\"",
            other
        ))),
    }
}

fn transport(e: curl::Error) -> FetchFailure {
    FetchFailure::Transport(e.to_string())
}

/// Body-receipt failures are read errors; everything else is transport.
fn classify(e: curl::Error) -> FetchFailure {
    if e.is_recv_error() || e.is_partial_file() || e.is_read_error() || e.is_write_error() {
        FetchFailure::Read(e.to_string())
    } else {
        FetchFailure::Transport(e.to_string())
    }
}
