//! Typed request descriptors.
//!
//! # Design
//! A `Request<T, E>` declares everything needed to perform one HTTP call and
//! to turn its body into a `T`: method, target, query, headers, body, cache
//! policy, timeout and a decoder returning `Result<T, E>`. Builders consume
//! and return `self`; once handed to a `Client` the descriptor is only read.
//!
//! `transport_request` derives the transport-ready form deterministically,
//! so building the same descriptor twice yields equal `TransportRequest`s.

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::DecodeError;
use crate::http::{HeaderName, HeaderValue, Headers, HttpMethod};
use crate::transport::{CachePolicy, TransportRequest};

/// Timeout applied when a descriptor does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Decoder turning a response body into the request's success type.
pub type Decoder<T, E> = dyn Fn(&[u8]) -> Result<T, E> + Send + Sync;

/// One `name[=value]` pair of the query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryItem {
    pub name: String,
    pub value: Option<String>,
}

impl QueryItem {
    pub fn new(name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            value: value.map(Into::into),
        }
    }

    /// A bare `name` with no value.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    fn encode(&self) -> String {
        match &self.value {
            Some(value) => format!("{}={}", percent_encode(&self.name), percent_encode(value)),
            None => percent_encode(&self.name),
        }
    }
}

impl<N: Into<String>, V: Into<String>> From<(N, V)> for QueryItem {
    fn from((name, value): (N, V)) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Declarative description of one HTTP request and how to decode its body.
pub struct Request<T, E = DecodeError> {
    method: HttpMethod,
    url: String,
    query: Option<Vec<QueryItem>>,
    headers: Option<Headers>,
    body: Option<Bytes>,
    cache_policy: CachePolicy,
    timeout: Duration,
    decoder: Arc<Decoder<T, E>>,
}

impl<T, E> Request<T, E> {
    /// A GET request to `url` decoded by `decode`.
    pub fn new<F>(url: impl Into<String>, decode: F) -> Self
    where
        F: Fn(&[u8]) -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            method: HttpMethod::default(),
            url: url.into(),
            query: None,
            headers: None,
            body: None,
            cache_policy: CachePolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            decoder: Arc::new(decode),
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Replace the query list.
    pub fn with_query<I, Q>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = Q>,
        Q: Into<QueryItem>,
    {
        self.query = Some(items.into_iter().map(Into::into).collect());
        self
    }

    /// Append one query item.
    pub fn with_query_item(mut self, item: impl Into<QueryItem>) -> Self {
        self.query.get_or_insert_with(Vec::new).push(item.into());
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_header(
        mut self,
        name: impl Into<HeaderName>,
        value: impl Into<HeaderValue>,
    ) -> Self {
        self.headers.get_or_insert_with(Headers::new).insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `body` as JSON and set `Content-Type: application/json`.
    pub fn with_json_body<B: Serialize + ?Sized>(self, body: &B) -> Result<Self, DecodeError> {
        let bytes = serde_json::to_vec(body)?;
        Ok(self
            .with_header(HeaderName::CONTENT_TYPE, HeaderValue::APPLICATION_JSON)
            .with_body(bytes))
    }

    pub fn with_cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn query(&self) -> Option<&[QueryItem]> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> Option<&Headers> {
        self.headers.as_ref()
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.cache_policy
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run this request's decoder over a response body.
    pub fn decode(&self, data: &[u8]) -> Result<T, E> {
        (self.decoder)(data)
    }

    pub(crate) fn decoder(&self) -> Arc<Decoder<T, E>> {
        Arc::clone(&self.decoder)
    }

    /// Absolute URL with the query appended, ahead of any fragment.
    pub fn encoded_url(&self) -> String {
        let items = match self.query.as_deref() {
            Some(items) if !items.is_empty() => items,
            _ => return self.url.clone(),
        };
        let query = items.iter().map(QueryItem::encode).collect::<Vec<_>>().join("&");
        let (base, fragment) = match self.url.split_once('#') {
            Some((base, fragment)) => (base, Some(fragment)),
            None => (self.url.as_str(), None),
        };
        let separator = if !base.contains('?') {
            "?"
        } else if base.ends_with('?') || base.ends_with('&') {
            ""
        } else {
            "&"
        };
        match fragment {
            Some(fragment) => format!("{base}{separator}{query}#{fragment}"),
            None => format!("{base}{separator}{query}"),
        }
    }

    /// Build the transport-ready form of this descriptor.
    pub fn transport_request(&self) -> TransportRequest {
        TransportRequest {
            method: self.method,
            url: self.encoded_url(),
            headers: self.headers.clone().unwrap_or_default(),
            body: self.body.clone(),
            cache_policy: self.cache_policy,
            timeout: self.timeout,
        }
    }
}

impl<T: DeserializeOwned> Request<T, DecodeError> {
    /// A GET request whose body is decoded as JSON into `T`.
    pub fn json(url: impl Into<String>) -> Self {
        Self::new(url, |data| Ok(serde_json::from_slice(data)?))
    }

    /// Like `json`, but decodes the value stored under `key` of a root object.
    pub fn json_at_key(url: impl Into<String>, key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(url, move |data| {
            let mut root: serde_json::Map<String, serde_json::Value> =
                serde_json::from_slice(data)?;
            let value = root.remove(&key).ok_or_else(|| DecodeError::MissingKey(key.clone()))?;
            Ok(serde_json::from_value(value)?)
        })
    }
}

impl Request<String, DecodeError> {
    /// A GET request whose body is returned as UTF-8 text.
    pub fn text(url: impl Into<String>) -> Self {
        Self::new(url, |data| Ok(std::str::from_utf8(data)?.to_string()))
    }
}

impl Request<Bytes, Infallible> {
    /// A GET request whose body is returned untouched.
    pub fn raw(url: impl Into<String>) -> Self {
        Self::new(url, |data| Ok(Bytes::copy_from_slice(data)))
    }
}

impl<T, E> Clone for Request<T, E> {
    fn clone(&self) -> Self {
        Self {
            method: self.method,
            url: self.url.clone(),
            query: self.query.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            cache_policy: self.cache_policy,
            timeout: self.timeout,
            decoder: Arc::clone(&self.decoder),
        }
    }
}

impl<T, E> fmt::Debug for Request<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(Bytes::len))
            .field("cache_policy", &self.cache_policy)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
