//! Verify request building, response parsing and error delivery against the
//! JSON test vectors stored in `test-vectors/`.
//!
//! Request bodies and parsed values are compared as JSON values, not raw
//! strings, so field ordering never causes false negatives.

use std::sync::{Arc, Mutex};

use jsonreq_core::dispatch::build_request;
use jsonreq_core::{
    DecodeError, Headers, HttpMethod, NetworkResponse, Request, TransportError, TypedJsonRequest,
};
use serde::Deserialize;
use serde_json::Value;

const URL: &str = "https://api.example.com/items/5";

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize, PartialEq)]
struct ApiError {
    code: u16,
    message: String,
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        "PATCH" => HttpMethod::Patch,
        other => panic!("unknown method: {other}"),
    }
}

fn parse_headers(value: &Value) -> Headers {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn parse_response(value: &Value) -> NetworkResponse {
    let data = match value.get("body_bytes") {
        Some(bytes) => bytes
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b.as_u64().unwrap() as u8)
            .collect(),
        None => value["body"].as_str().unwrap().as_bytes().to_vec(),
    };
    NetworkResponse::new(
        value["status"].as_u64().unwrap() as u16,
        parse_headers(&value["headers"]),
        data,
    )
}

fn parse_failure(value: &Value) -> TransportError {
    match value["kind"].as_str().unwrap() {
        "response" => TransportError::from_response(parse_response(value)),
        "timeout" => TransportError::Timeout,
        "no_connection" => TransportError::NoConnection("connection refused".to_string()),
        other => panic!("unknown failure kind: {other}"),
    }
}

fn unused_listener<T>() -> Box<dyn FnOnce(T) + Send> {
    Box::new(|_: T| panic!("success listener must not fire"))
}

// ---------------------------------------------------------------------------
// Build
// ---------------------------------------------------------------------------

#[test]
fn build_test_vectors() {
    let raw = include_str!("../../test-vectors/build.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let body = Some(case["body"].clone()).filter(|b| !b.is_null());
        let headers = Some(&case["headers"]).filter(|h| !h.is_null()).map(parse_headers);

        let request: TypedJsonRequest<Item, ApiError> = TypedJsonRequest::new(
            parse_method(case["method"].as_str().unwrap()),
            case["url"].as_str().unwrap(),
            body,
            headers,
            unused_listener(),
            None,
        );
        assert_eq!(request.body_content_type(), "application/json; charset=utf-8", "{name}: content type");

        let expected = &case["expected_request"];
        let req = build_request(&request);
        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, expected["url"].as_str().unwrap(), "{name}: url");
        assert_eq!(req.headers, parse_headers(&expected["headers"]), "{name}: headers");

        match expected["body"].as_str() {
            Some(expected_body) => {
                let sent: Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
                let wanted: Value = serde_json::from_str(expected_body).unwrap();
                assert_eq!(sent, wanted, "{name}: body");
            }
            None => assert!(req.body.is_none(), "{name}: body should be None"),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse
// ---------------------------------------------------------------------------

#[test]
fn parse_response_test_vectors() {
    let raw = include_str!("../../test-vectors/parse_response.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let request: TypedJsonRequest<Item, ApiError> =
            TypedJsonRequest::new(HttpMethod::Get, URL, None, None, unused_listener(), None);

        let result = request.parse_network_response(&parse_response(&case["response"]));

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "Json" => assert!(
                    matches!(err, TransportError::Parse(DecodeError::Json(_))),
                    "{name}: expected Json, got {err:?}"
                ),
                "UnsupportedCharset" => assert!(
                    matches!(err, TransportError::Parse(DecodeError::UnsupportedCharset { .. })),
                    "{name}: expected UnsupportedCharset, got {err:?}"
                ),
                other => panic!("{name}: unknown expected_error: {other}"),
            }
        } else {
            let parsed = result.unwrap();
            let expected: Item = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(parsed.value, expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Deliver error
// ---------------------------------------------------------------------------

#[test]
fn deliver_error_test_vectors() {
    let raw = include_str!("../../test-vectors/deliver_error.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let received = Arc::new(Mutex::new(Vec::<Option<ApiError>>::new()));
        let sink = Arc::clone(&received);
        let request: TypedJsonRequest<Item, ApiError> = TypedJsonRequest::new(
            HttpMethod::Get,
            URL,
            None,
            None,
            unused_listener(),
            Some(Box::new(move |error| sink.lock().unwrap().push(error))),
        );

        request.deliver_error(parse_failure(&case["failure"]));

        let expected: Option<ApiError> = serde_json::from_value(case["expected_error"].clone()).unwrap();
        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1, "{name}: error listener fires exactly once");
        assert_eq!(received[0], expected, "{name}: delivered error");
    }
}
