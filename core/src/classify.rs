//! Classification of raw transport outcomes.
//!
//! # Design
//! `classify` is pure and total. When no HTTP response is present the
//! transport error is mapped through a fixed table of cause categories;
//! anything unrecognized, including a missing error, becomes
//! `UnknownTransportError`. When an HTTP response is present the transport
//! error is ignored and the status code decides.

use bytes::Bytes;

use crate::error::FailureKind;
use crate::http::{HttpResponse, HttpStatus};
use crate::transport::{RawResponse, TransportError, TransportErrorKind, TransportOutcome};

/// A 2xx response with a non-empty body, ready for decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSuccess {
    pub data: Bytes,
    pub response: HttpResponse,
    pub raw: RawResponse,
}

/// A classified failure with whatever response context survived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkFailure {
    pub kind: FailureKind,
    pub response: Option<HttpResponse>,
    pub raw: Option<RawResponse>,
}

impl NetworkFailure {
    fn new(kind: FailureKind, response: Option<HttpResponse>, raw: Option<RawResponse>) -> Self {
        Self { kind, response, raw }
    }
}

/// Outcome of one request before any caller-specific decoding.
pub type ClassifiedOutcome = Result<NetworkSuccess, NetworkFailure>;

/// Map a transport error cause onto the failure taxonomy.
pub fn failure_kind_for(error: Option<&TransportError>) -> FailureKind {
    match error.map(|e| e.kind) {
        Some(TransportErrorKind::NotConnected) => FailureKind::NoConnection,
        Some(TransportErrorKind::TimedOut) => FailureKind::TimedOut,
        Some(TransportErrorKind::Cancelled) => FailureKind::Cancelled,
        _ => FailureKind::UnknownTransportError,
    }
}

/// Classify what a transport reported into success or a single failure kind.
pub fn classify(
    body: Option<Bytes>,
    raw: Option<RawResponse>,
    error: Option<&TransportError>,
) -> ClassifiedOutcome {
    let (raw, code) = match raw {
        Some(raw) => match raw.status {
            Some(code) => (raw, code),
            None => return Err(NetworkFailure::new(failure_kind_for(error), None, Some(raw))),
        },
        None => return Err(NetworkFailure::new(failure_kind_for(error), None, None)),
    };

    let body = body.filter(|b| !b.is_empty());
    let response = HttpResponse::new(code, body.clone(), Some(raw.headers.clone()));

    let kind = match response.status() {
        HttpStatus::Success(_) => match body {
            Some(data) => return Ok(NetworkSuccess { data, response, raw }),
            None => FailureKind::NoData,
        },
        HttpStatus::Redirection(_) => FailureKind::Redirection,
        HttpStatus::ClientError(code) => FailureKind::ClientError(code),
        HttpStatus::ServerError(code) => FailureKind::ServerError(code),
        HttpStatus::Unknown => FailureKind::UnknownStatusCode,
    };
    Err(NetworkFailure::new(kind, Some(response), Some(raw)))
}

impl TransportOutcome {
    pub fn classify(self) -> ClassifiedOutcome {
        classify(self.body, self.response, self.error.as_ref())
    }
}
