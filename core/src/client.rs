//! Caller-facing client: runs typed `Request`s and decodes their bodies.
//!
//! # Design
//! `Client` turns a `Request<T, E>` into a `TransportRequest`, hands it to its
//! `ExecutionService`, and applies the request's decoder to a successful
//! body. Classified failures are wrapped as `ClientError::Network` and never
//! reach the decoder; decoder failures are wrapped as
//! `ClientError::DataTransformation` and never masquerade as network errors.
//!
//! Results are delivered in one of two places:
//! - `execute` returns a future; the outcome is observed on whichever task
//!   awaits it.
//! - `execute_with` runs a callback on the client's `Dispatcher`, a single
//!   serial task shared by every callback of this client.
//!
//! Dropping the client cancels all of its outstanding requests.

use std::future::Future;

use tracing::{debug, warn};

use crate::config::TransportConfig;
use crate::dispatch::Dispatcher;
use crate::error::ClientError;
use crate::execution::ExecutionService;
use crate::request::Request;
use crate::transport::{Transport, TransportRequest};
use crate::ureq_transport::UreqTransport;

pub struct Client {
    execution: ExecutionService,
    dispatcher: Dispatcher,
}

impl Client {
    /// Build a client over `transport`. Must be called from within a Tokio runtime.
    pub fn new(transport: impl Transport) -> Self {
        Self {
            execution: ExecutionService::new(transport),
            dispatcher: Dispatcher::spawn(),
        }
    }

    /// A client backed by `UreqTransport` configured from the environment.
    pub fn from_env() -> Self {
        Self::new(UreqTransport::new(TransportConfig::from_env()))
    }

    /// Start `request` and return a future resolving to its decoded value.
    ///
    /// The request is in flight as soon as this returns, so `cancel` can be
    /// called before the future is first polled.
    pub fn execute<T, E>(
        &self,
        request: &Request<T, E>,
    ) -> impl Future<Output = Result<T, ClientError<E>>> + Send + 'static
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        let decoder = request.decoder();
        let execution = self.execution.execute(request.transport_request());
        async move {
            match execution.await {
                Ok(success) => decoder(&success.data[..]).map_err(|err| {
                    debug!(url = %success.raw.url, "decoder rejected response body");
                    ClientError::DataTransformation(err)
                }),
                Err(failure) => Err(ClientError::Network {
                    kind: failure.kind,
                    response: failure.response,
                }),
            }
        }
    }

    /// Start `request` and deliver its outcome to `callback` on this client's
    /// dispatcher.
    pub fn execute_with<T, E, F>(&self, request: &Request<T, E>, callback: F)
    where
        T: Send + 'static,
        E: Send + 'static,
        F: FnOnce(Result<T, ClientError<E>>) + Send + 'static,
    {
        let pending = self.execute(request);
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            let result = pending.await;
            if !dispatcher.dispatch(move || callback(result)) {
                warn!("dispatcher stopped, dropping callback");
            }
        });
    }

    /// Cancel in-flight work matching `request`'s transport identity.
    pub fn cancel<T, E>(&self, request: &Request<T, E>) {
        self.execution.cancel(&request.transport_request());
    }

    pub fn cancel_transport_request(&self, request: &TransportRequest) {
        self.execution.cancel(request);
    }

    pub fn cancel_all(&self) {
        self.execution.cancel_all();
    }

    pub fn in_flight_count(&self) -> usize {
        self.execution.in_flight_count()
    }

    /// The serial context `execute_with` callbacks run on.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.execution.cancel_all();
    }
}
