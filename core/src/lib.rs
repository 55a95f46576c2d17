//! Typed JSON requests over a host-driven HTTP transport.
//!
//! # Overview
//! [`TypedJsonRequest`] carries a JSON body out and brings a typed value
//! back: the success body is deserialized into `T`, an error body into `E`.
//! The crate never performs I/O. A dispatcher (the host) turns the request
//! into an [`HttpRequest`], executes it, and hands the result to
//! [`dispatch::complete`], which fires exactly one of the request's
//! deliveries.
//!
//! # Design
//! - [`Request`] is the contract between a request and its dispatcher.
//! - Charset selection and cache-control parsing live in [`headers`] and
//!   work on any response, not just JSON ones.
//! - Decoding failures are absorbed: the success path reports
//!   [`TransportError::Parse`], the error path reports `None` (or
//!   [`ErrorBody::Undecodable`] through the outcome channel).

pub mod codec;
pub mod dispatch;
pub mod error;
pub mod headers;
pub mod http;
pub mod request;

pub use codec::{PROTOCOL_CHARSET, PROTOCOL_CONTENT_TYPE};
pub use error::{DecodeError, TransportError};
pub use headers::CacheEntry;
pub use http::{Headers, HttpMethod, HttpRequest, NetworkResponse, Parsed, Request};
pub use request::{
    ErrorBody, ErrorListener, Listener, Outcome, OutcomeReceiver, RequestFailure, TypedJsonRequest,
};
