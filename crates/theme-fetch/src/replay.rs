//! Recorded responses for local debugging and tests.
//!
//! `ReplayFetcher` answers requests from canned responses and can hold
//! individual requests back until released, which makes response ordering
//! fully controllable. `RecordingFetcher` wraps a live transport and
//! captures every exchange into a `Recording` that a `ReplayFetcher` can
//! load later.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use theme_core::FetchError;
use tokio::sync::oneshot;

use crate::client::Fetcher;
use crate::response::FetchResponse;

/// A recorded request/response pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedExchange {
    /// URL requested, as passed by the component.
    pub url: String,
    /// HTTP status code (0 when the request failed before a response).
    pub status_code: u16,
    /// Content type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Response body.
    pub body: String,
    /// Transport error message, when the request failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Fetch duration in microseconds.
    pub duration_us: u64,
}

/// A set of recorded exchanges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recording {
    /// Recording version.
    pub version: u32,
    /// When the recording was made.
    pub recorded_at: DateTime<Utc>,
    /// Storefront origin.
    pub base_url: String,
    /// Exchanges in request order.
    pub exchanges: Vec<RecordedExchange>,
}

impl Recording {
    /// Current recording format version.
    pub const VERSION: u32 = 1;

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Response(FetchResponse),
    Failure(FetchError),
}

/// Releases one held-back request.
#[derive(Debug)]
pub struct ReplayGate {
    sender: oneshot::Sender<()>,
}

impl ReplayGate {
    /// Let the held request complete.
    pub fn release(self) {
        let _ = self.sender.send(());
    }
}

/// Fetcher serving canned responses.
#[derive(Debug, Default)]
pub struct ReplayFetcher {
    sticky: RefCell<HashMap<String, Reply>>,
    queued: RefCell<HashMap<String, VecDeque<Reply>>>,
    gates: RefCell<HashMap<String, VecDeque<oneshot::Receiver<()>>>>,
    requests: RefCell<Vec<String>>,
}

impl ReplayFetcher {
    /// Create an empty fetcher. Unknown URLs answer 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a recording. Later exchanges for the same URL are served
    /// after earlier ones; the last one sticks.
    pub fn from_recording(recording: &Recording) -> Self {
        let fetcher = Self::new();
        for exchange in &recording.exchanges {
            let reply = match &exchange.error {
                Some(message) => Reply::Failure(FetchError::Connection(message.clone())),
                None => {
                    let status =
                        StatusCode::from_u16(exchange.status_code).unwrap_or(StatusCode::BAD_GATEWAY);
                    let mut response = FetchResponse::new(status, exchange.body.clone());
                    response.content_type = exchange.content_type.clone();
                    Reply::Response(response)
                }
            };
            fetcher.enqueue(&exchange.url, reply.clone());
            fetcher.sticky.borrow_mut().insert(exchange.url.clone(), reply);
        }
        fetcher
    }

    fn enqueue(&self, url: &str, reply: Reply) {
        self.queued
            .borrow_mut()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Answer every request for `url` with `body` and a 200 status.
    pub fn respond(&self, url: &str, body: impl Into<String>) {
        self.sticky
            .borrow_mut()
            .insert(url.to_string(), Reply::Response(FetchResponse::ok(body)));
    }

    /// Answer every request for `url` with a full response.
    pub fn respond_with(&self, url: &str, response: FetchResponse) {
        self.sticky
            .borrow_mut()
            .insert(url.to_string(), Reply::Response(response));
    }

    /// Answer the next request for `url` with `body`; later requests fall
    /// back to the sticky response.
    pub fn respond_once(&self, url: &str, body: impl Into<String>) {
        self.enqueue(url, Reply::Response(FetchResponse::ok(body)));
    }

    /// Fail every request for `url`.
    pub fn fail(&self, url: &str, error: FetchError) {
        self.sticky
            .borrow_mut()
            .insert(url.to_string(), Reply::Failure(error));
    }

    /// Hold the next request for `url` until the returned gate is released.
    pub fn gate(&self, url: &str) -> ReplayGate {
        let (sender, receiver) = oneshot::channel();
        self.gates
            .borrow_mut()
            .entry(url.to_string())
            .or_default()
            .push_back(receiver);
        ReplayGate { sender }
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// Number of requests made for `url`.
    pub fn request_count(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|u| *u == url).count()
    }
}

#[async_trait(?Send)]
impl Fetcher for ReplayFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.requests.borrow_mut().push(url.to_string());

        let gate = self
            .gates
            .borrow_mut()
            .get_mut(url)
            .and_then(|queue| queue.pop_front());
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let queued = self
            .queued
            .borrow_mut()
            .get_mut(url)
            .and_then(|queue| queue.pop_front());
        let reply = queued.or_else(|| self.sticky.borrow().get(url).cloned());

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Failure(error)) => Err(error),
            None => Ok(FetchResponse::new(StatusCode::NOT_FOUND, "")),
        }
    }
}

/// Transport wrapper that records every exchange.
pub struct RecordingFetcher {
    inner: Rc<dyn Fetcher>,
    exchanges: RefCell<Vec<RecordedExchange>>,
}

impl RecordingFetcher {
    /// Wrap a live transport.
    pub fn new(inner: Rc<dyn Fetcher>) -> Self {
        Self {
            inner,
            exchanges: RefCell::new(Vec::new()),
        }
    }

    /// Number of exchanges recorded so far.
    pub fn len(&self) -> usize {
        self.exchanges.borrow().len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.exchanges.borrow().is_empty()
    }

    /// Snapshot the exchanges into a recording.
    pub fn to_recording(&self, base_url: &str) -> Recording {
        Recording {
            version: Recording::VERSION,
            recorded_at: Utc::now(),
            base_url: base_url.to_string(),
            exchanges: self.exchanges.borrow().clone(),
        }
    }
}

#[async_trait(?Send)]
impl Fetcher for RecordingFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let start = Instant::now();
        let result = self.inner.get(url).await;
        let duration_us = start.elapsed().as_micros() as u64;

        let exchange = match &result {
            Ok(response) => RecordedExchange {
                url: url.to_string(),
                status_code: response.status.as_u16(),
                content_type: response.content_type.clone(),
                body: response.body.clone(),
                error: None,
                duration_us,
            },
            Err(error) => RecordedExchange {
                url: url.to_string(),
                status_code: error.status().unwrap_or(0),
                content_type: None,
                body: String::new(),
                error: Some(error.to_string()),
                duration_us,
            },
        };
        self.exchanges.borrow_mut().push(exchange);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queued_then_sticky() {
        let fetcher = ReplayFetcher::new();
        fetcher.respond("/a", "sticky");
        fetcher.respond_once("/a", "first");

        assert_eq!(fetcher.get("/a").await.unwrap().body, "first");
        assert_eq!(fetcher.get("/a").await.unwrap().body, "sticky");
        assert_eq!(fetcher.get("/missing").await.unwrap().status, StatusCode::NOT_FOUND);
        assert_eq!(fetcher.request_count("/a"), 2);
    }

    #[tokio::test]
    async fn test_gate_controls_completion_order() {
        let fetcher = ReplayFetcher::new();
        fetcher.respond("/slow", "slow");
        fetcher.respond("/fast", "fast");
        let gate = fetcher.gate("/slow");

        let order = RefCell::new(Vec::new());
        let slow = async {
            let body = fetcher.get("/slow").await.unwrap().body;
            order.borrow_mut().push(body);
        };
        let fast = async {
            let body = fetcher.get("/fast").await.unwrap().body;
            order.borrow_mut().push(body);
            gate.release();
        };
        futures::join!(slow, fast);

        assert_eq!(*order.borrow(), vec!["fast".to_string(), "slow".to_string()]);
    }

    #[tokio::test]
    async fn test_recording_roundtrip() {
        let live = ReplayFetcher::new();
        live.respond("/cart?section_id=cart-drawer", "<div id=\"CartDrawer\"></div>");
        let recorder = RecordingFetcher::new(Rc::new(live));
        recorder.get("/cart?section_id=cart-drawer").await.unwrap();

        let json = recorder.to_recording("https://shop.example.com").to_json().unwrap();
        let replay = ReplayFetcher::from_recording(&Recording::from_json(&json).unwrap());
        let response = replay.get("/cart?section_id=cart-drawer").await.unwrap();
        assert_eq!(response.body, "<div id=\"CartDrawer\"></div>");
    }
}
