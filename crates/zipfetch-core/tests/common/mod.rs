#![allow(dead_code)]

pub mod origin_server;

use std::time::Duration;
use zipfetch_core::downloader::Downloader;
use zipfetch_core::fetch::CurlFetcher;
use zipfetch_core::gate::AdmissionGate;
use zipfetch_core::lifecycle::ArchiveService;

/// Reply as seen by an HTTP client.
#[derive(Debug)]
pub struct Reply {
    pub status: u32,
    pub headers: Vec<String>,
    pub body: Vec<u8>,
}

impl Reply {
    /// Value of the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.iter().find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.trim()
                .eq_ignore_ascii_case(name)
                .then(|| v.trim().to_string())
        })
    }
}

/// Service over `dir` with the real curl fetcher.
pub fn service(dir: &std::path::Path, requests: usize, downloads: usize) -> ArchiveService {
    ArchiveService::new(
        dir.to_path_buf(),
        AdmissionGate::new(requests),
        Downloader::new(
            AdmissionGate::new(downloads),
            std::sync::Arc::new(CurlFetcher),
            Duration::from_secs(10),
        ),
    )
}

/// Bind on an ephemeral port and serve in the background. Returns the base URL.
pub async fn spawn_server(svc: ArchiveService) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        zipfetch_core::server::serve_with_shutdown(listener, svc, std::future::pending())
            .await
            .unwrap();
    });
    format!("http://{}", addr)
}

/// Blocking request with libcurl. `body` of `None` sends a GET.
pub fn request(url: &str, body: Option<&str>) -> Reply {
    let mut headers = Vec::new();
    let mut out = Vec::new();
    let mut easy = curl::easy::Easy::new();
    easy.url(url).unwrap();
    easy.noproxy("*").unwrap();
    easy.timeout(Duration::from_secs(20)).unwrap();
    if let Some(body) = body {
        let mut list = curl::easy::List::new();
        list.append("Content-Type: application/json").unwrap();
        easy.http_headers(list).unwrap();
        easy.post(true).unwrap();
        easy.post_fields_copy(body.as_bytes()).unwrap();
    }
    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|h| {
                headers.push(String::from_utf8_lossy(h).trim_end().to_string());
                true
            })
            .unwrap();
        transfer
            .write_function(|data| {
                out.extend_from_slice(data);
                Ok(data.len())
            })
            .unwrap();
        transfer.perform().unwrap();
    }
    Reply {
        status: easy.response_code().unwrap(),
        headers,
        body: out,
    }
}

/// `request` on a blocking thread.
pub async fn post(url: String, body: String) -> Reply {
    tokio::task::spawn_blocking(move || request(&url, Some(&body)))
        .await
        .unwrap()
}

pub fn zip_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    use std::io::Read;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut f = archive.by_index(i).unwrap();
            let mut body = Vec::new();
            f.read_to_end(&mut body).unwrap();
            (f.name().to_string(), body)
        })
        .collect()
}
