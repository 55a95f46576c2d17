//! Transport boundary types for the host-does-IO pattern.
//!
//! # Design
//! The adapter never touches the network. A dispatcher (the host) turns a
//! [`Request`] into an [`HttpRequest`], executes it, and hands the resulting
//! [`NetworkResponse`] or [`TransportError`] back to the request. The trait
//! below is the whole contract the dispatcher relies on.
//!
//! Headers are kept as owned `(name, value)` pairs in arrival order; lookups
//! compare names case-insensitively.

use std::fmt;

use crate::error::TransportError;
use crate::headers::{CacheEntry, DEFAULT_CONTENT_CHARSET};

/// Ordered list of `(name, value)` header pairs.
pub type Headers = Vec<(String, String)>;

/// Content type a request reports when it does not override
/// [`Request::body_content_type`].
pub const DEFAULT_BODY_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Trace,
    Patch,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data, ready for the host to execute.
///
/// Produced by [`crate::dispatch::build_request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

/// Raw response as delivered by the transport: status, headers and the
/// undecoded body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkResponse {
    pub status: u16,
    pub headers: Headers,
    pub data: Vec<u8>,
}

impl NetworkResponse {
    pub fn new(status: u16, headers: Headers, data: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            data: data.into(),
        }
    }

    /// Case-insensitive header lookup. Returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Case-insensitive lookup of the first header named `name`.
pub fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Headers the transport sends when a request supplies none of its own.
pub fn default_headers() -> &'static [(String, String)] {
    &[]
}

/// A successfully parsed response plus the freshness metadata derived from
/// its headers.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub cache_entry: Option<CacheEntry>,
}

/// What [`Request::parse_network_response`] hands back to the dispatcher.
pub type Response<T> = Result<Parsed<T>, TransportError>;

/// The contract between a request and the dispatcher that executes it.
///
/// The dispatcher calls `parse_network_response` on a worker of its
/// choosing, then exactly one of `deliver_response` or `deliver_error`.
/// Both delivery methods consume the request, so a second delivery does not
/// type-check.
pub trait Request: Send {
    type Output: Send;

    fn method(&self) -> HttpMethod;

    fn url(&self) -> &str;

    fn headers(&self) -> &[(String, String)] {
        default_headers()
    }

    fn body_content_type(&self) -> &str {
        DEFAULT_BODY_CONTENT_TYPE
    }

    fn body(&self) -> Option<Vec<u8>> {
        None
    }

    /// Charset assumed for a response whose `Content-Type` names none.
    fn default_charset(&self) -> &str {
        DEFAULT_CONTENT_CHARSET
    }

    /// Turn a 2xx response into the request's output type. Must not panic;
    /// failures are returned as [`TransportError::Parse`].
    fn parse_network_response(&self, response: &NetworkResponse) -> Response<Self::Output>;

    fn deliver_response(self, response: Self::Output)
    where
        Self: Sized;

    fn deliver_error(self, error: TransportError)
    where
        Self: Sized;
}
