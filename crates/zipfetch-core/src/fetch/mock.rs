//! Scripted fetcher for unit tests.

use super::{FetchFailure, FetchResponse, Fetcher};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
struct Script {
    delay: Duration,
    reply: Result<FetchResponse, FetchFailure>,
}

/// Answers by exact URL; unknown URLs get a 404. Tracks calls and the peak
/// number of concurrent `get` calls.
#[derive(Default)]
pub(crate) struct MockFetcher {
    scripts: Mutex<HashMap<String, Script>>,
    default_delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl MockFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_default_delay(delay: Duration) -> Self {
        Self {
            default_delay: delay,
            ..Self::default()
        }
    }

    pub(crate) fn ok(self, url: &str, content_type: Option<&str>, body: &[u8]) -> Self {
        self.ok_after(url, Duration::ZERO, content_type, body)
    }

    pub(crate) fn ok_after(
        self,
        url: &str,
        delay: Duration,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Self {
        let reply = Ok(FetchResponse {
            status: 200,
            reason: Some("OK".to_string()),
            content_type: content_type.map(str::to_string),
            body: body.to_vec(),
        });
        self.script(url, delay, reply)
    }

    pub(crate) fn status(self, url: &str, status: u32, reason: &str) -> Self {
        let reply = Ok(FetchResponse {
            status,
            reason: Some(reason.to_string()),
            content_type: None,
            body: Vec::new(),
        });
        self.script(url, Duration::ZERO, reply)
    }

    pub(crate) fn failure(self, url: &str, failure: FetchFailure) -> Self {
        self.script(url, Duration::ZERO, Err(failure))
    }

    fn script(self, url: &str, delay: Duration, reply: Result<FetchResponse, FetchFailure>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(url.to_string(), Script { delay, reply });
        self
    }

    pub(crate) fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Fetcher for MockFetcher {
    fn get(&self, url: &str, _timeout: Duration) -> Result<FetchResponse, FetchFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let script = self.scripts.lock().unwrap().get(url).cloned();
        let (delay, reply) = match script {
            Some(s) => (s.delay.max(self.default_delay), s.reply),
            None => (
                self.default_delay,
                Ok(FetchResponse {
                    status: 404,
                    reason: Some("Not Found".to_string()),
                    ..FetchResponse::default()
                }),
            ),
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}
