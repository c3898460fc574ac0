//! HTTP vocabulary shared by descriptors, transports and the classifier.
//!
//! # Design
//! These types describe methods, headers and responses as plain data. Status
//! categorization is a pure function of the numeric code, so `HttpResponse`
//! stores only the code and derives its `HttpStatus` on demand.
//!
//! Header names keep the spelling the caller supplied (two spellings are two
//! distinct map keys) but lookups through `Headers::get` ignore ASCII case.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use bytes::Bytes;

use crate::error::ParseMethodError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
    Connect,
}

impl HttpMethod {
    /// Upper-case wire name, e.g. `"GET"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Connect => "CONNECT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "TRACE" => Ok(HttpMethod::Trace),
            "CONNECT" => Ok(HttpMethod::Connect),
            _ => Err(ParseMethodError(s.to_string())),
        }
    }
}

/// Name of an HTTP header, stored with the caller's spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeaderName(Cow<'static, str>);

impl HeaderName {
    pub const ACCEPT: HeaderName = HeaderName::from_static("Accept");
    pub const ACCEPT_CHARSET: HeaderName = HeaderName::from_static("Accept-Charset");
    pub const ACCEPT_ENCODING: HeaderName = HeaderName::from_static("Accept-Encoding");
    pub const ACCEPT_LANGUAGE: HeaderName = HeaderName::from_static("Accept-Language");
    pub const AUTHORIZATION: HeaderName = HeaderName::from_static("Authorization");
    pub const CACHE_CONTROL: HeaderName = HeaderName::from_static("Cache-Control");
    pub const CONTENT_LENGTH: HeaderName = HeaderName::from_static("Content-Length");
    pub const CONTENT_TYPE: HeaderName = HeaderName::from_static("Content-Type");
    pub const DATE: HeaderName = HeaderName::from_static("Date");
    pub const LOCATION: HeaderName = HeaderName::from_static("Location");
    pub const RETRY_AFTER: HeaderName = HeaderName::from_static("Retry-After");
    pub const USER_AGENT: HeaderName = HeaderName::from_static("User-Agent");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against another spelling.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for HeaderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HeaderName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for HeaderName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Value of an HTTP header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeaderValue(Cow<'static, str>);

impl HeaderValue {
    pub const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");
    pub const APPLICATION_FORM_URL_ENCODED: HeaderValue =
        HeaderValue::from_static("application/x-www-form-urlencoded");
    pub const APPLICATION_XML: HeaderValue = HeaderValue::from_static("application/xml");
    pub const MULTIPART_FORM: HeaderValue = HeaderValue::from_static("multipart/form-data");
    pub const TEXT_PLAIN: HeaderValue = HeaderValue::from_static("text/plain");
    pub const IMAGE_PNG: HeaderValue = HeaderValue::from_static("image/png");
    pub const IMAGE_JPEG: HeaderValue = HeaderValue::from_static("image/jpeg");
    pub const IMAGE_GIF: HeaderValue = HeaderValue::from_static("image/gif");
    pub const ENCODING_GZIP: HeaderValue = HeaderValue::from_static("gzip");
    pub const ENCODING_DEFLATE: HeaderValue = HeaderValue::from_static("deflate");
    pub const ENCODING_BR: HeaderValue = HeaderValue::from_static("br");
    pub const ENCODING_IDENTITY: HeaderValue = HeaderValue::from_static("identity");
    pub const CHARSET_UTF8: HeaderValue = HeaderValue::from_static("utf-8");
    pub const NO_CACHE: HeaderValue = HeaderValue::from_static("no-cache");

    pub const fn from_static(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }

    pub fn new(value: impl Into<String>) -> Self {
        Self(Cow::Owned(value.into()))
    }

    /// `Bearer <token>` for the `Authorization` header.
    pub fn bearer(token: &str) -> Self {
        Self::new(format!("Bearer {token}"))
    }

    /// `Basic <base64(user:password)>` for the `Authorization` header.
    pub fn basic(user: &str, password: &str) -> Self {
        Self::new(format!("Basic {}", BASE64_STANDARD.encode(format!("{user}:{password}"))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Ordered header map keyed by `HeaderName`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Headers(BTreeMap<HeaderName, HeaderValue>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any value stored under the exact same spelling.
    pub fn insert(
        &mut self,
        name: impl Into<HeaderName>,
        value: impl Into<HeaderValue>,
    ) -> Option<HeaderValue> {
        self.0.insert(name.into(), value.into())
    }

    /// Look up a header ignoring ASCII case. An exact-spelling match wins.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.0
            .get(&HeaderName::new(name))
            .or_else(|| self.0.iter().find(|(k, _)| k.matches(name)).map(|(_, v)| v))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.0.iter()
    }

    /// Owned `(name, value)` pairs in key order.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.as_str().to_string()))
            .collect()
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<HeaderName>,
    V: Into<HeaderValue>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(n, v)| (n.into(), v.into())).collect())
    }
}

/// Category of a numeric status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpStatus {
    Unknown,
    Success(u16),
    Redirection(u16),
    ClientError(u16),
    ServerError(u16),
}

impl HttpStatus {
    /// Total over the integer domain: anything outside 200..=599 is `Unknown`.
    pub fn categorize(code: u16) -> Self {
        match code {
            200..=299 => HttpStatus::Success(code),
            300..=399 => HttpStatus::Redirection(code),
            400..=499 => HttpStatus::ClientError(code),
            500..=599 => HttpStatus::ServerError(code),
            _ => HttpStatus::Unknown,
        }
    }

    pub fn code(&self) -> Option<u16> {
        match *self {
            HttpStatus::Unknown => None,
            HttpStatus::Success(c)
            | HttpStatus::Redirection(c)
            | HttpStatus::ClientError(c)
            | HttpStatus::ServerError(c) => Some(c),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, HttpStatus::Success(_))
    }

    /// Canonical reason phrase for well-known codes.
    pub fn reason(&self) -> Option<&'static str> {
        let reason = match self.code()? {
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            402 => "Payment Required",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            406 => "Not Acceptable",
            408 => "Request Timeout",
            409 => "Conflict",
            410 => "Gone",
            412 => "Precondition Failed",
            413 => "Payload Too Large",
            415 => "Unsupported Media Type",
            418 => "I'm a teapot",
            422 => "Unprocessable Entity",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            501 => "Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => return None,
        };
        Some(reason)
    }
}

/// A response received from the server, described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub code: u16,
    pub body: Option<Bytes>,
    pub headers: Option<Headers>,
}

impl HttpResponse {
    pub fn new(code: u16, body: Option<Bytes>, headers: Option<Headers>) -> Self {
        Self { code, body, headers }
    }

    pub fn status(&self) -> HttpStatus {
        HttpStatus::categorize(self.code)
    }

    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.as_ref().and_then(|h| h.get(name))
    }
}
