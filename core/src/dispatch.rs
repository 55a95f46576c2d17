//! The slice of a request queue that drives a [`Request`] through its
//! lifecycle: describe it for the host, then route the host's result to
//! exactly one delivery method.

use crate::error::TransportError;
use crate::headers::CacheEntry;
use crate::http::{header_value, HttpRequest, NetworkResponse, Request};

/// Describe `request` as plain data for the host to execute.
///
/// `Content-Type` is added only when there is a body and the request's own
/// headers do not already set one.
pub fn build_request<R: Request>(request: &R) -> HttpRequest {
    let mut headers = request.headers().to_vec();
    let body = request.body();
    if body.is_some() && header_value(&headers, "Content-Type").is_none() {
        headers.push((
            "Content-Type".to_string(),
            request.body_content_type().to_string(),
        ));
    }
    HttpRequest {
        method: request.method(),
        url: request.url().to_string(),
        headers,
        body,
    }
}

/// Finish `request` with the host's result.
///
/// Non-2xx responses and parse failures become `deliver_error`; a parsed
/// 2xx body becomes `deliver_response`. Returns the cache metadata of a
/// successful delivery so the host may store it.
pub fn complete<R: Request>(
    request: R,
    result: Result<NetworkResponse, TransportError>,
) -> Option<CacheEntry> {
    let response = match result {
        Ok(response) => response,
        Err(error) => {
            tracing::debug!(url = request.url(), %error, "transport failure");
            request.deliver_error(error);
            return None;
        }
    };

    if !response.is_success() {
        tracing::debug!(url = request.url(), status = response.status, "non-success status");
        request.deliver_error(TransportError::from_response(response));
        return None;
    }

    match request.parse_network_response(&response) {
        Ok(parsed) => {
            request.deliver_response(parsed.value);
            parsed.cache_entry
        }
        Err(error) => {
            request.deliver_error(error);
            None
        }
    }
}
