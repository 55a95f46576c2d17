//! `TypedJsonRequest`: a JSON request whose success and error bodies are
//! deserialized into caller-chosen types.
//!
//! # Design
//! The request owns everything it needs for one round trip: the serialized
//! body, the headers, and the delivery target. Delivery is either a pair of
//! callbacks (`new`) or a one-shot channel (`with_outcome`). Both delivery
//! methods take `self` by value, so a request can complete at most once.
//!
//! Failures never escape. On the success path a bad body becomes
//! `TransportError::Parse` for the dispatcher to route back into
//! `deliver_error`. On the error path a bad body becomes `None` for callback
//! listeners, or `ErrorBody::Undecodable` for channel listeners.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::codec::{decode_json, PROTOCOL_CHARSET, PROTOCOL_CONTENT_TYPE};
use crate::error::{DecodeError, TransportError};
use crate::headers::parse_cache_headers;
use crate::http::{default_headers, Headers, HttpMethod, NetworkResponse, Parsed, Request, Response};

/// Receives the parsed success value.
pub type Listener<T> = Box<dyn FnOnce(T) + Send>;

/// Receives the parsed error body, or `None` when there was no body or it
/// could not be decoded.
pub type ErrorListener<E> = Box<dyn FnOnce(Option<E>) + Send>;

/// Terminal value delivered through [`OutcomeReceiver`].
pub type Outcome<T, E> = Result<T, RequestFailure<E>>;

/// Resolves once with the request's [`Outcome`]. Yields `RecvError` if the
/// request is dropped without being delivered.
pub type OutcomeReceiver<T, E> = oneshot::Receiver<Outcome<T, E>>;

/// What became of the error payload on a failed request.
#[derive(Debug)]
pub enum ErrorBody<E> {
    /// The payload decoded into the error type.
    Parsed(E),
    /// The failure carried no response, or an empty body.
    Missing,
    /// A payload was present but could not be decoded.
    Undecodable(DecodeError),
}

impl<E> ErrorBody<E> {
    /// Collapse to the callback view: only a parsed body survives.
    pub fn into_option(self) -> Option<E> {
        match self {
            ErrorBody::Parsed(error) => Some(error),
            ErrorBody::Missing | ErrorBody::Undecodable(_) => None,
        }
    }
}

/// A failed request: the transport's verdict plus the decoded error body.
#[derive(Debug)]
pub struct RequestFailure<E> {
    pub cause: TransportError,
    pub body: ErrorBody<E>,
}

enum Delivery<T, E> {
    Callbacks {
        listener: Listener<T>,
        error_listener: Option<ErrorListener<E>>,
    },
    Channel(oneshot::Sender<Outcome<T, E>>),
}

/// An HTTP request with a JSON body whose response is deserialized into `T`
/// and whose error payload is deserialized into `E`.
pub struct TypedJsonRequest<T, E> {
    method: HttpMethod,
    url: String,
    headers: Option<Headers>,
    body: Option<String>,
    default_charset: String,
    delivery: Delivery<T, E>,
}

impl<T, E> TypedJsonRequest<T, E>
where
    T: DeserializeOwned + Send + 'static,
    E: DeserializeOwned + Send + 'static,
{
    /// Build a request that reports through callbacks.
    ///
    /// `body` is serialized once here. `None` means the request carries no
    /// body. `headers` replaces the transport defaults when non-empty.
    /// Without an `error_listener`, failures are dropped silently.
    pub fn new(
        method: HttpMethod,
        url: impl Into<String>,
        body: Option<Value>,
        headers: Option<Headers>,
        listener: Listener<T>,
        error_listener: Option<ErrorListener<E>>,
    ) -> Self {
        Self::with_delivery(
            method,
            url.into(),
            body,
            headers,
            Delivery::Callbacks {
                listener,
                error_listener,
            },
        )
    }

    /// Build a request that reports through a one-shot channel.
    ///
    /// Unlike the callback form, the failure side keeps the transport error
    /// and tells a missing error body apart from an undecodable one.
    pub fn with_outcome(
        method: HttpMethod,
        url: impl Into<String>,
        body: Option<Value>,
        headers: Option<Headers>,
    ) -> (Self, OutcomeReceiver<T, E>) {
        let (tx, rx) = oneshot::channel();
        let request = Self::with_delivery(method, url.into(), body, headers, Delivery::Channel(tx));
        (request, rx)
    }

    /// Charset assumed when a response's `Content-Type` names none.
    /// Defaults to UTF-8.
    pub fn with_default_charset(mut self, label: impl Into<String>) -> Self {
        self.default_charset = label.into();
        self
    }

    fn with_delivery(
        method: HttpMethod,
        url: String,
        body: Option<Value>,
        headers: Option<Headers>,
        delivery: Delivery<T, E>,
    ) -> Self {
        Self {
            method,
            url,
            headers,
            body: body.map(|value| value.to_string()),
            default_charset: PROTOCOL_CHARSET.to_string(),
            delivery,
        }
    }

    /// The serialized request body, if any.
    pub fn body_text(&self) -> Option<&str> {
        self.body.as_deref()
    }

    fn decode_error_body(&self, response: Option<&NetworkResponse>) -> ErrorBody<E> {
        let Some(response) = response.filter(|response| !response.data.is_empty()) else {
            return ErrorBody::Missing;
        };
        match decode_json(response, &self.default_charset) {
            Ok(error) => ErrorBody::Parsed(error),
            Err(err) => {
                let reason = if err.is_encoding() {
                    "unsupported encoding"
                } else {
                    "malformed json"
                };
                tracing::error!(
                    url = %self.url,
                    status = response.status,
                    reason,
                    error = %err,
                    "could not decode error body"
                );
                ErrorBody::Undecodable(err)
            }
        }
    }
}

impl<T, E> Request for TypedJsonRequest<T, E>
where
    T: DeserializeOwned + Send + 'static,
    E: DeserializeOwned + Send + 'static,
{
    type Output = T;

    fn method(&self) -> HttpMethod {
        self.method
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn headers(&self) -> &[(String, String)] {
        match self.headers.as_deref() {
            Some(headers) if !headers.is_empty() => headers,
            _ => default_headers(),
        }
    }

    fn body_content_type(&self) -> &str {
        PROTOCOL_CONTENT_TYPE
    }

    fn body(&self) -> Option<Vec<u8>> {
        self.body.as_ref().map(|body| body.as_bytes().to_vec())
    }

    fn default_charset(&self) -> &str {
        &self.default_charset
    }

    fn parse_network_response(&self, response: &NetworkResponse) -> Response<T> {
        match decode_json(response, self.default_charset()) {
            Ok(value) => Ok(Parsed {
                value,
                cache_entry: parse_cache_headers(response),
            }),
            Err(err) => {
                tracing::debug!(url = %self.url, status = response.status, error = %err, "response body did not parse");
                Err(TransportError::Parse(err))
            }
        }
    }

    fn deliver_response(self, response: T) {
        match self.delivery {
            Delivery::Callbacks { listener, .. } => listener(response),
            Delivery::Channel(tx) => {
                if tx.send(Ok(response)).is_err() {
                    tracing::debug!(url = %self.url, "outcome receiver dropped before delivery");
                }
            }
        }
    }

    fn deliver_error(self, error: TransportError) {
        if matches!(
            self.delivery,
            Delivery::Callbacks {
                error_listener: None,
                ..
            }
        ) {
            return;
        }

        let body = self.decode_error_body(error.network_response());
        match self.delivery {
            Delivery::Callbacks {
                error_listener: Some(error_listener),
                ..
            } => error_listener(body.into_option()),
            Delivery::Callbacks { .. } => {}
            Delivery::Channel(tx) => {
                let failure = RequestFailure { cause: error, body };
                if tx.send(Err(failure)).is_err() {
                    tracing::debug!(url = %self.url, "outcome receiver dropped before delivery");
                }
            }
        }
    }
}

impl<T, E> fmt::Debug for TypedJsonRequest<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedJsonRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("default_charset", &self.default_charset)
            .finish_non_exhaustive()
    }
}
