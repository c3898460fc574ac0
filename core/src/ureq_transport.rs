//! `Transport` implementation backed by `ureq`.
//!
//! # Design
//! ureq is blocking, so each request runs on Tokio's blocking pool. A fresh
//! agent is configured per request to apply the descriptor's timeout and
//! this transport's redirect and user-agent settings; status codes are never
//! turned into errors so the classifier sees every response.
//!
//! Dropping the `send` future abandons the result; the blocking call itself
//! runs until ureq's own timeout fires.

use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, trace};
use ureq::http;

use crate::config::TransportConfig;
use crate::http::{HeaderName, HeaderValue, Headers};
use crate::transport::{
    RawResponse, Transport, TransportError, TransportErrorKind, TransportOutcome, TransportRequest,
};

#[derive(Debug, Clone, Default)]
pub struct UreqTransport {
    config: TransportConfig,
}

impl UreqTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn agent(&self, request: &TransportRequest) -> ureq::Agent {
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(request.timeout))
            .max_redirects(self.config.effective_max_redirects())
            .user_agent(self.config.user_agent.as_str())
            .build()
            .new_agent()
    }

    fn perform(&self, request: TransportRequest) -> TransportOutcome {
        let agent = self.agent(&request);

        let mut builder = http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in request.headers.iter() {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let cache_control = HeaderName::CACHE_CONTROL;
        let caller_set_cache_control = request.headers.contains(cache_control.as_str());
        if request.cache_policy.forces_reload() && !caller_set_cache_control {
            builder = builder.header(cache_control.as_str(), HeaderValue::NO_CACHE.as_str());
        }

        let result = match request.body {
            Some(body) => builder.body(body.to_vec()).map(|req| agent.run(req)),
            None => builder.body(()).map(|req| agent.run(req)),
        };
        let mut response = match result {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => return TransportOutcome::failed(map_error(&err)),
            Err(err) => {
                let error = TransportError::new(TransportErrorKind::BadUrl, err.to_string());
                return TransportOutcome::failed(error);
            }
        };

        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let raw = RawResponse {
            url: request.url,
            status: Some(response.status().as_u16()),
            headers,
        };

        match response
            .body_mut()
            .with_config()
            .limit(self.config.max_body_size)
            .read_to_vec()
        {
            Ok(body) => TransportOutcome::response(raw, Some(Bytes::from(body))),
            Err(err) => {
                debug!(
                    url = %raw.url,
                    status = ?raw.status,
                    error = %err,
                    "failed to read response body"
                );
                TransportOutcome::failed(map_error(&err))
            }
        }
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn send(&self, request: TransportRequest) -> TransportOutcome {
        trace!(method = %request.method, url = %request.url, "dispatching to ureq");
        let this = self.clone();
        match tokio::task::spawn_blocking(move || this.perform(request)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let error = TransportError::new(TransportErrorKind::Other, err.to_string());
                TransportOutcome::failed(error)
            }
        }
    }
}

/// Fold ureq's error space onto transport cause categories.
fn map_error(err: &ureq::Error) -> TransportError {
    let kind = match err {
        ureq::Error::Timeout(_) => TransportErrorKind::TimedOut,
        ureq::Error::HostNotFound => TransportErrorKind::HostNotFound,
        ureq::Error::ConnectionFailed => TransportErrorKind::NotConnected,
        ureq::Error::BadUri(_) | ureq::Error::Http(_) => TransportErrorKind::BadUrl,
        ureq::Error::TooManyRedirects => TransportErrorKind::TooManyRedirects,
        ureq::Error::BodyExceedsLimit(_) => TransportErrorKind::BodyTooLarge,
        ureq::Error::Protocol(_) => TransportErrorKind::Protocol,
        ureq::Error::Io(io_err) => map_io_error(io_err.kind()),
        _ => TransportErrorKind::Other,
    };
    TransportError::new(kind, err.to_string())
}

fn map_io_error(kind: io::ErrorKind) -> TransportErrorKind {
    match kind {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::NotConnected
        | io::ErrorKind::AddrNotAvailable => TransportErrorKind::NotConnected,
        io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof => TransportErrorKind::ConnectionLost,
        io::ErrorKind::TimedOut => TransportErrorKind::TimedOut,
        _ => TransportErrorKind::Io,
    }
}
