//! Single-lane request queue.
//!
//! Requests are dispatched one at a time in strict FIFO order, and two
//! dispatches never start closer together than the configured interval. The
//! interval is measured from the start of one dispatch to the start of the
//! next, so a slow response does not add to the spacing.
//!
//! A failing request only fails its own caller; the queue keeps going. There
//! is no retry, priority or cancellation: once enqueued, a request dispatches
//! even if its caller stops waiting.

use super::error::{QueueError, TransportError};
use super::transport::Transport;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

/// Spacing used by the public Jikan instance
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1100);

/// Description of one outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl RequestSpec {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Append a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append extra filter parameters
    pub fn params<'a>(mut self, params: impl IntoIterator<Item = &'a (String, String)>) -> Self {
        self.query.extend(params.into_iter().cloned());
        self
    }
}

/// Raw payload of a successful call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

struct QueuedRequest {
    spec: RequestSpec,
    respond_to: oneshot::Sender<Result<RawResponse, TransportError>>,
}

/// Handle to the dispatch loop.
///
/// Cloning is cheap; all clones feed the same FIFO. The loop stops once every
/// handle is dropped and the pending requests have been dispatched.
#[derive(Clone)]
pub struct RequestQueue {
    sender: mpsc::UnboundedSender<QueuedRequest>,
}

impl RequestQueue {
    /// Start the dispatch loop on the current tokio runtime
    pub fn new<T>(transport: T, interval: Duration) -> Self
    where
        T: Transport + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(dispatch_loop(transport, receiver, interval));

        debug!(interval_ms = interval.as_millis() as u64, "Request queue started");
        Self { sender }
    }

    /// Queue a request and get a future for its outcome.
    ///
    /// The request joins the FIFO when this is called, not when the returned
    /// future is first polled.
    pub fn enqueue(
        &self,
        spec: RequestSpec,
    ) -> impl Future<Output = Result<RawResponse, QueueError>> + Send + 'static {
        let (respond_to, response) = oneshot::channel();
        let accepted = self
            .sender
            .send(QueuedRequest { spec, respond_to })
            .is_ok();

        async move {
            if !accepted {
                return Err(QueueError::Closed);
            }

            match response.await {
                Ok(result) => result.map_err(QueueError::from),
                Err(_) => Err(QueueError::Closed),
            }
        }
    }
}

async fn dispatch_loop<T: Transport>(
    transport: T,
    mut receiver: mpsc::UnboundedReceiver<QueuedRequest>,
    interval: Duration,
) {
    while let Some(QueuedRequest { spec, respond_to }) = receiver.recv().await {
        let started = Instant::now();
        debug!(method = %spec.method, path = %spec.path, "Dispatching request");

        let result = transport.send(&spec).await;
        if let Err(e) = &result {
            warn!(path = %spec.path, error = %e, "Request failed");
        }

        if respond_to.send(result).is_err() {
            debug!(path = %spec.path, "Caller stopped waiting for response");
        }

        sleep_until(started + interval).await;
    }

    debug!("Request queue closed");
}
