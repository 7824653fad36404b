//! Tests for batch fetch ordering, validation and the download gate bound.

use super::*;
use crate::fetch::mock::MockFetcher;
use crate::fetch::FetchFailure;

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn downloader(fetcher: Arc<MockFetcher>, capacity: usize) -> Downloader {
    Downloader::new(
        AdmissionGate::new(capacity),
        fetcher,
        Duration::from_secs(30),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn results_follow_input_order_not_completion_order() {
    // First URL finishes last, last URL finishes first.
    let fetcher = MockFetcher::new()
        .ok_after("https://h/a.bin", Duration::from_millis(150), None, b"a")
        .ok_after("https://h/b.bin", Duration::from_millis(100), None, b"b")
        .ok_after("https://h/c.bin", Duration::from_millis(50), None, b"c")
        .ok_after("https://h/d.bin", Duration::ZERO, None, b"d")
        .shared();
    let list = urls(&[
        "https://h/a.bin",
        "https://h/b.bin",
        "https://h/c.bin",
        "https://h/d.bin",
    ]);

    let results = downloader(fetcher, 4).fetch_all(&list).await;

    assert_eq!(results.len(), 4);
    for (result, (url, body)) in results
        .iter()
        .zip(list.iter().zip([b"a", b"b", b"c", b"d"]))
    {
        assert_eq!(&result.url, url);
        assert_eq!(result.content(), Some(&body[..]));
    }
    assert_eq!(results[0].filename, "a.bin");
    assert_eq!(results[3].filename, "d.bin");
}

#[tokio::test]
async fn invalid_urls_never_reach_the_network() {
    let fetcher = MockFetcher::new().shared();
    let list = urls(&["not a url", "/relative/path.jpg", "example.com/a.jpg", ""]);

    let results = downloader(Arc::clone(&fetcher), 2).fetch_all(&list).await;

    assert_eq!(fetcher.calls(), 0);
    assert_eq!(results.len(), list.len());
    for r in &results {
        assert_eq!(r.error(), Some(&ItemError::InvalidUrl));
        assert!(r.filename.is_empty());
    }
    assert_eq!(results[0].error().unwrap().to_string(), "invalid URL");
}

#[tokio::test]
async fn unsupported_scheme_is_a_fetch_failure_not_invalid_url() {
    let fetcher = MockFetcher::new()
        .failure(
            "ftp://example.com/file.bin",
            FetchFailure::Transport("unsupported protocol scheme \"ftp\"".to_string()),
        )
        .shared();
    let list = urls(&["ftp://example.com/file.bin"]);

    let results = downloader(Arc::clone(&fetcher), 1).fetch_all(&list).await;

    assert_eq!(fetcher.calls(), 1);
    assert_eq!(
        results[0].error().unwrap().to_string(),
        "download failed: unsupported protocol scheme \"ftp\""
    );
}

#[tokio::test]
async fn non_ok_status_is_fetch_failed_with_status_text() {
    let fetcher = MockFetcher::new()
        .status("https://h/missing", 404, "Not Found")
        .status("https://h/created", 201, "Created")
        .shared();
    let list = urls(&["https://h/missing", "https://h/created"]);

    let results = downloader(fetcher, 2).fetch_all(&list).await;

    assert_eq!(
        results[0].error(),
        Some(&ItemError::FetchFailed("server returned: 404 Not Found".to_string()))
    );
    assert_eq!(
        results[1].error(),
        Some(&ItemError::FetchFailed("server returned: 201 Created".to_string()))
    );
}

#[tokio::test]
async fn transport_and_read_failures_are_classified() {
    let fetcher = MockFetcher::new()
        .failure(
            "https://h/down",
            FetchFailure::Transport("Couldn't connect to server".to_string()),
        )
        .failure(
            "https://h/cut",
            FetchFailure::Read("Failure when receiving data from the peer".to_string()),
        )
        .shared();
    let list = urls(&["https://h/down", "https://h/cut"]);

    let results = downloader(fetcher, 2).fetch_all(&list).await;

    assert_eq!(
        results[0].error().unwrap().to_string(),
        "download failed: Couldn't connect to server"
    );
    assert!(matches!(results[1].error(), Some(ItemError::ReadFailed(_))));
    assert_eq!(
        results[1].error().unwrap().to_string(),
        "failed to read content: Failure when receiving data from the peer"
    );
}

#[tokio::test]
async fn root_url_gets_indexed_name_with_mime_extension() {
    let fetcher = MockFetcher::new()
        .ok("https://h/", Some("image/png"), b"png")
        .ok("https://other/", Some("text/html; charset=utf-8"), b"<html>")
        .shared();
    let list = urls(&["bad", "https://h/", "https://other/"]);

    let results = downloader(fetcher, 3).fetch_all(&list).await;

    assert_eq!(results[1].filename, "file_1.png");
    assert_eq!(results[2].filename, "file_2");
}

#[tokio::test]
async fn empty_batch_returns_empty() {
    let fetcher = MockFetcher::new().shared();
    let results = downloader(Arc::clone(&fetcher), 1).fetch_all(&[]).await;
    assert!(results.is_empty());
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn gate_bounds_in_flight_fetches() {
    let fetcher = MockFetcher::with_default_delay(Duration::from_millis(40)).shared();
    let list: Vec<String> = (0..8).map(|i| format!("https://h/{}.bin", i)).collect();

    let d = downloader(Arc::clone(&fetcher), 2);
    let results = d.fetch_all(&list).await;

    assert_eq!(results.len(), 8);
    assert_eq!(fetcher.calls(), 8);
    assert!(fetcher.peak_in_flight() <= 2, "peak {}", fetcher.peak_in_flight());
    assert_eq!(d.gate().available(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn gate_is_shared_across_concurrent_batches() {
    let fetcher = MockFetcher::with_default_delay(Duration::from_millis(40)).shared();
    let d = downloader(Arc::clone(&fetcher), 3);
    let first: Vec<String> = (0..5).map(|i| format!("https://a/{}", i)).collect();
    let second: Vec<String> = (0..5).map(|i| format!("https://b/{}", i)).collect();

    let (r1, r2) = tokio::join!(d.fetch_all(&first), d.fetch_all(&second));

    assert_eq!(r1.len() + r2.len(), 10);
    assert_eq!(fetcher.calls(), 10);
    assert!(fetcher.peak_in_flight() <= 3, "peak {}", fetcher.peak_in_flight());
}

#[tokio::test]
async fn closed_gate_fails_every_item_without_fetching() {
    let fetcher = MockFetcher::new()
        .ok("https://h/a.bin", None, b"a")
        .shared();
    let d = downloader(Arc::clone(&fetcher), 2);
    d.gate().close();

    let results = d.fetch_all(&urls(&["https://h/a.bin", "https://h/b.bin"])).await;

    assert_eq!(fetcher.calls(), 0);
    for r in &results {
        assert_eq!(
            r.error(),
            Some(&ItemError::FetchFailed(
                "download failed: admission gate is closed".to_string()
            ))
        );
    }
}
