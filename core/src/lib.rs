//! Typed HTTP requests over a pluggable transport.
//!
//! # Overview
//! Callers describe a request as a `Request<T, E>` value: method, URL, query,
//! headers, body, cache policy, timeout and a decoder producing `T` or `E`.
//! A `Client` runs it and yields either the decoded `T` or a `ClientError<E>`
//! drawn from a closed failure taxonomy. No status codes to inspect, no
//! transport requests to assemble by hand.
//!
//! # Design
//! - `request` builds a `TransportRequest` deterministically from a descriptor.
//! - `execution` spawns the transport call, tracks it in a mutex-guarded
//!   in-flight table keyed by the transport request, and supports cancel by
//!   key and cancel-all.
//! - `classify` is a pure function from what the transport reported to a
//!   success carrying a non-empty body or exactly one `FailureKind`.
//! - `client` applies the descriptor's decoder and delivers the result as a
//!   future or on a serial `Dispatcher`.
//! - The transport is a trait. `UreqTransport` is the bundled implementation;
//!   tests substitute scripted ones.

pub mod classify;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod execution;
pub mod http;
pub mod request;
pub mod transport;
pub mod ureq_transport;

pub use classify::{classify, ClassifiedOutcome, NetworkFailure, NetworkSuccess};
pub use client::Client;
pub use config::TransportConfig;
pub use dispatch::Dispatcher;
pub use error::{ClientError, DecodeError, FailureKind, ParseMethodError};
pub use execution::{Execution, ExecutionService};
pub use http::{HeaderName, HeaderValue, Headers, HttpMethod, HttpResponse, HttpStatus};
pub use request::{QueryItem, Request, DEFAULT_TIMEOUT};
pub use transport::{
    CachePolicy, RawResponse, Transport, TransportError, TransportErrorKind, TransportOutcome,
    TransportRequest,
};
pub use ureq_transport::UreqTransport;
