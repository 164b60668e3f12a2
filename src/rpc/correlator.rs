use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local};
use serde_json::Value;
use tokio::sync::oneshot;

use super::types::JsonRpcRequest;
use super::CorrelationMode;
use crate::error::{Result, SseClientError};
use crate::transport::Transport;

type Delivery = Result<Value>;

struct PendingRequest {
    created_at: DateTime<Local>,
    tx: oneshot::Sender<Delivery>,
}

#[derive(Default)]
struct PendingTable {
    requests: HashMap<String, PendingRequest>,
    /// Set by `fail_all`; no waiter can be registered afterwards.
    closed: bool,
}

/// Allocates request ids, submits requests, and routes responses back to callers.
///
/// The pending table is shared with the background reader, which resolves
/// entries when a stream frame carries a matching `id`.
pub struct RequestCorrelator {
    mode: CorrelationMode,
    next_id: AtomicU64,
    pending: Mutex<PendingTable>,
}

impl RequestCorrelator {
    pub fn new(mode: CorrelationMode) -> Self {
        Self {
            mode,
            next_id: AtomicU64::new(1),
            pending: Mutex::new(PendingTable::default()),
        }
    }

    pub fn mode(&self) -> CorrelationMode {
        self.mode
    }

    pub fn next_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }

    fn table(&self) -> MutexGuard<'_, PendingTable> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a waiter for `id`. The entry is removed when the returned guard drops.
    ///
    /// Fails with `NotConnected` once `fail_all` has run, since nothing would
    /// ever resolve the entry.
    pub fn register(&self, id: &str) -> Result<PendingCall<'_>> {
        let (tx, rx) = oneshot::channel();
        let mut table = self.table();
        if table.closed {
            return Err(SseClientError::NotConnected);
        }
        table.requests.insert(
            id.to_string(),
            PendingRequest {
                created_at: Local::now(),
                tx,
            },
        );
        drop(table);

        Ok(PendingCall {
            id: id.to_string(),
            rx: Some(rx),
            correlator: self,
        })
    }

    /// Deliver a response. Returns `false` when nobody is waiting for `id`.
    pub fn resolve(&self, id: &str, response: Value) -> bool {
        let Some(pending) = self.table().requests.remove(id) else {
            return false;
        };
        let waited = Local::now().signed_duration_since(pending.created_at);
        tracing::debug!(id = %id, waited_ms = waited.num_milliseconds(), "Correlated response");
        pending.tx.send(Ok(response)).is_ok()
    }

    /// Fail every pending request and refuse new ones, e.g. when the stream goes away.
    pub fn fail_all(&self, error: impl Fn() -> SseClientError) {
        let drained: Vec<(String, PendingRequest)> = {
            let mut table = self.table();
            table.closed = true;
            table.requests.drain().collect()
        };
        for (id, pending) in drained {
            tracing::debug!(id = %id, "Failing pending request");
            let _ = pending.tx.send(Err(error()));
        }
    }

    pub fn pending_count(&self) -> usize {
        self.table().requests.len()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.table().requests.contains_key(id)
    }

    /// Submit `method` to `submit_url` and wait for its response.
    pub async fn call(
        &self,
        transport: &dyn Transport,
        submit_url: &str,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value> {
        let id = self.next_id();
        let request = JsonRpcRequest::new(id.clone(), method, params);
        let body = serde_json::to_string(&request)?;

        tracing::debug!(id = %id, method = %method, url = %submit_url, mode = ?self.mode, "Sending request");

        let exchange = async {
            match self.mode {
                CorrelationMode::Direct => transport.post(submit_url, body).await?.into_json(),
                CorrelationMode::Stream => {
                    // Registered before the POST so a fast reply on the stream is not missed
                    let pending = self.register(&id)?;
                    transport.post(submit_url, body).await?.ensure_success()?;
                    pending.wait().await
                }
            }
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(id = %id, method = %method, "Request timed out");
                Err(SseClientError::RequestTimeout {
                    id: id.clone(),
                    timeout,
                })
            }
        }
    }
}

/// A registered waiter. Dropping it, on completion, timeout, or cancellation,
/// removes the pending entry so a late response finds nothing to match.
pub struct PendingCall<'a> {
    id: String,
    rx: Option<oneshot::Receiver<Delivery>>,
    correlator: &'a RequestCorrelator,
}

impl PendingCall<'_> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn wait(mut self) -> Result<Value> {
        let Some(rx) = self.rx.take() else {
            return Err(SseClientError::Closed);
        };
        match rx.await {
            Ok(delivery) => delivery,
            Err(_) => Err(SseClientError::Closed),
        }
    }
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        self.correlator.table().requests.remove(&self.id);
    }
}
