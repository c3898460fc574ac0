//! Execution service: runs transport operations and tracks them while in flight.
//!
//! # Design
//! Every `execute` call registers an entry in the in-flight table before the
//! operation is spawned, so a `cancel` issued right after `execute` returns
//! always finds it. Entries are keyed by the full `TransportRequest` value;
//! structurally identical requests share a key and `cancel` stops all of them.
//! Each entry also carries a unique id so that a completing operation removes
//! only its own entry and the table never holds finished work.
//!
//! The table sits behind a single `parking_lot::Mutex`. Completions arrive on
//! Tokio worker threads while callers may cancel from anywhere, and every
//! access goes through that lock. Cancellation tokens are fired after the
//! lock is released.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::classify::{ClassifiedOutcome, NetworkFailure};
use crate::error::FailureKind;
use crate::transport::{Transport, TransportError, TransportOutcome, TransportRequest};

struct Entry {
    id: u64,
    token: CancellationToken,
}

#[derive(Default)]
struct InFlightTable {
    entries: Mutex<HashMap<TransportRequest, Vec<Entry>>>,
    next_id: AtomicU64,
}

impl InFlightTable {
    fn register(&self, request: &TransportRequest) -> (u64, CancellationToken) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        self.entries.lock().entry(request.clone()).or_default().push(Entry {
            id,
            token: token.clone(),
        });
        (id, token)
    }

    fn complete(&self, request: &TransportRequest, id: u64) {
        let mut entries = self.entries.lock();
        if let Some(list) = entries.get_mut(request) {
            list.retain(|entry| entry.id != id);
            if list.is_empty() {
                entries.remove(request);
            }
        }
    }

    fn cancel(&self, request: &TransportRequest) -> usize {
        let removed = self.entries.lock().remove(request).unwrap_or_default();
        for entry in &removed {
            entry.token.cancel();
        }
        removed.len()
    }

    fn cancel_all(&self) -> usize {
        let drained: Vec<Entry> = self.entries.lock().drain().flat_map(|(_, list)| list).collect();
        for entry in &drained {
            entry.token.cancel();
        }
        drained.len()
    }

    fn len(&self) -> usize {
        self.entries.lock().values().map(Vec::len).sum()
    }

    fn contains(&self, request: &TransportRequest) -> bool {
        self.entries.lock().contains_key(request)
    }
}

/// Runs requests through a `Transport` and classifies what comes back.
///
/// Dropping the service cancels everything it still tracks.
pub struct ExecutionService {
    transport: Arc<dyn Transport>,
    table: Arc<InFlightTable>,
}

impl ExecutionService {
    pub fn new(transport: impl Transport) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    pub fn from_arc(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            table: Arc::new(InFlightTable::default()),
        }
    }

    /// Start `request` on the Tokio runtime and return a handle to its outcome.
    ///
    /// Must be called from within a Tokio runtime. The operation is tracked
    /// before this returns; awaiting the handle is not required for it to run.
    pub fn execute(&self, request: TransportRequest) -> Execution {
        let (id, token) = self.table.register(&request);
        let (tx, rx) = oneshot::channel();
        let transport = Arc::clone(&self.transport);
        let table = Arc::clone(&self.table);

        debug!(
            method = %request.method,
            url = %request.url,
            in_flight = table.len(),
            "starting request"
        );

        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => TransportOutcome::failed(TransportError::cancelled()),
                outcome = transport.send(request.clone()) => outcome,
            };
            table.complete(&request, id);

            let classified = outcome.classify();
            match &classified {
                Ok(success) => debug!(
                    method = %request.method,
                    url = %request.url,
                    status = success.response.code,
                    bytes = success.data.len(),
                    "request succeeded"
                ),
                Err(failure) => debug!(
                    method = %request.method,
                    url = %request.url,
                    status = failure.response.as_ref().map(|r| r.code),
                    kind = %failure.kind,
                    "request failed"
                ),
            }
            if tx.send(classified).is_err() {
                trace!(url = %request.url, "outcome dropped, receiver gone");
            }
        });

        Execution { rx }
    }

    /// Cancel every tracked operation sharing `request`'s identity.
    /// Unknown or already finished requests are ignored.
    pub fn cancel(&self, request: &TransportRequest) {
        let cancelled = self.table.cancel(request);
        debug!(url = %request.url, cancelled, "cancel requested");
    }

    pub fn cancel_all(&self) {
        let cancelled = self.table.cancel_all();
        if cancelled > 0 {
            debug!(cancelled, "cancelled all in-flight requests");
        }
    }

    /// Number of operations started and not yet finished or cancelled.
    pub fn in_flight_count(&self) -> usize {
        self.table.len()
    }

    pub fn is_in_flight(&self, request: &TransportRequest) -> bool {
        self.table.contains(request)
    }
}

impl Drop for ExecutionService {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// Handle resolving to the classified outcome of one `execute` call.
///
/// If the worker task disappears without reporting (runtime shutdown), the
/// handle resolves to a `Cancelled` failure.
#[must_use = "the outcome is only observable by awaiting the handle"]
pub struct Execution {
    rx: oneshot::Receiver<ClassifiedOutcome>,
}

impl Future for Execution {
    type Output = ClassifiedOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|result| {
            result.unwrap_or_else(|_| {
                Err(NetworkFailure {
                    kind: FailureKind::Cancelled,
                    response: None,
                    raw: None,
                })
            })
        })
    }
}
