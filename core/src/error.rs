//! Error taxonomy for the request pipeline.
//!
//! # Design
//! Failures fall into three closed tiers. Transport-tier kinds mean no HTTP
//! response arrived, so there is no body to trust. Response-tier kinds mean a
//! response arrived but cannot be handed to a decoder. The decode tier is only
//! reachable after a response-tier success and carries the decoder's own
//! error type, so `ClientError<E>` is generic over it.

use thiserror::Error;

use crate::http::HttpResponse;

/// One member of the closed failure taxonomy produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum FailureKind {
    /// The host has no usable network route.
    #[error("no network connection")]
    NoConnection,

    #[error("request timed out")]
    TimedOut,

    #[error("request was cancelled")]
    Cancelled,

    /// A transport failure outside the recognized causes.
    #[error("unknown transport error")]
    UnknownTransportError,

    /// A 2xx response arrived with an absent or empty body.
    #[error("response contained no data")]
    NoData,

    #[error("unexpected redirection")]
    Redirection,

    #[error("client error: HTTP {0}")]
    ClientError(u16),

    #[error("server error: HTTP {0}")]
    ServerError(u16),

    /// The status code fell outside 200..=599.
    #[error("unknown status code")]
    UnknownStatusCode,
}

impl FailureKind {
    /// True when no HTTP response was received.
    pub fn is_transport_tier(&self) -> bool {
        matches!(
            self,
            FailureKind::NoConnection
                | FailureKind::TimedOut
                | FailureKind::Cancelled
                | FailureKind::UnknownTransportError
        )
    }

    /// True when a valid HTTP response was received but rejected.
    pub fn is_response_tier(&self) -> bool {
        !self.is_transport_tier()
    }

    /// Status code carried by the kind, if any.
    pub fn status_code(&self) -> Option<u16> {
        match *self {
            FailureKind::ClientError(code) | FailureKind::ServerError(code) => Some(code),
            _ => None,
        }
    }
}

/// Errors delivered to callers of `Client::execute`.
#[derive(Debug, Error)]
pub enum ClientError<E> {
    /// The request failed before a decodable body was available.
    #[error("network error: {kind}")]
    Network {
        kind: FailureKind,
        response: Option<HttpResponse>,
    },

    /// The body arrived but the request's decoder rejected it.
    #[error("data transformation failed: {0}")]
    DataTransformation(#[source] E),
}

impl<E> ClientError<E> {
    /// Failure kind for network errors; `None` for decode failures.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            ClientError::Network { kind, .. } => Some(*kind),
            ClientError::DataTransformation(_) => None,
        }
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            ClientError::Network { response, .. } => response.as_ref(),
            ClientError::DataTransformation(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == Some(FailureKind::Cancelled)
    }
}

/// Failures raised by the built-in decoders and body encoders.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The root decoding key was absent from the JSON object.
    #[error("missing root key `{0}`")]
    MissingKey(String),
}

/// An unrecognized HTTP method name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown HTTP method `{0}`")]
pub struct ParseMethodError(pub String);
