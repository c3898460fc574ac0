//! Transport capability consumed by the execution service.
//!
//! # Design
//! The core never opens sockets. A `Transport` takes a fully built
//! `TransportRequest` and reports back whatever it saw: body bytes, the raw
//! response head, and a transport error. All three are optional because a
//! transport may fail before, during or after receiving a response.
//!
//! Cancellation is expressed by dropping the future returned from
//! `Transport::send`; the execution service races it against a cancellation
//! token and drops the loser.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::http::{Headers, HttpMethod};

/// Cache behavior requested from the transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CachePolicy {
    /// Whatever the protocol's own caching rules dictate.
    #[default]
    UseProtocolCachePolicy,
    ReloadIgnoringLocalCacheData,
    ReloadIgnoringLocalAndRemoteCacheData,
    ReturnCacheDataElseLoad,
    ReturnCacheDataDontLoad,
    ReloadRevalidatingCacheData,
}

impl CachePolicy {
    /// Policies that require bypassing any cached copy.
    pub fn forces_reload(&self) -> bool {
        matches!(
            self,
            CachePolicy::ReloadIgnoringLocalCacheData
                | CachePolicy::ReloadIgnoringLocalAndRemoteCacheData
                | CachePolicy::ReloadRevalidatingCacheData
        )
    }
}

/// Transport-ready request built from a `Request` descriptor.
///
/// The whole value is the tracking identity in the in-flight table: two
/// requests that agree on every field share one identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransportRequest {
    pub method: HttpMethod,
    /// Absolute URL with the query already encoded.
    pub url: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
    pub cache_policy: CachePolicy,
    pub timeout: Duration,
}

/// Response head as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub url: String,
    /// `None` when the transport produced a non-HTTP response.
    pub status: Option<u16>,
    pub headers: Headers,
}

/// Cause categories a transport can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// No route to the network or the peer refused the connection.
    NotConnected,
    TimedOut,
    Cancelled,
    HostNotFound,
    ConnectionLost,
    BadUrl,
    TooManyRedirects,
    /// The response body exceeded the configured size limit.
    BodyTooLarge,
    Tls,
    Protocol,
    Io,
    Other,
}

/// A transport-level failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(TransportErrorKind::Cancelled, "request was cancelled")
    }
}

/// Everything a transport reports when an operation ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportOutcome {
    pub body: Option<Bytes>,
    pub response: Option<RawResponse>,
    pub error: Option<TransportError>,
}

impl TransportOutcome {
    pub fn response(response: RawResponse, body: Option<Bytes>) -> Self {
        Self {
            body,
            response: Some(response),
            error: None,
        }
    }

    pub fn failed(error: TransportError) -> Self {
        Self {
            body: None,
            response: None,
            error: Some(error),
        }
    }
}

/// Capability that actually moves bytes over the network.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Perform `request` and report what happened. Dropping the future
    /// abandons the operation.
    async fn send(&self, request: TransportRequest) -> TransportOutcome;
}
