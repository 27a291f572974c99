//! Request and response types shared across the routing layer.
//!
//! Bodies are fully buffered (`Full<Bytes>`): the transport collects the
//! request body before dispatch and handlers produce complete responses.

use bytes::Bytes;
use http_body_util::Full;

/// The HTTP request type dispatched by the router.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type produced by handlers and middlewares.
pub type Response = http::Response<Full<Bytes>>;

/// Extension trait for building common responses.
pub trait ResponseExt {
    /// Creates a plain-text response with the given status code.
    fn error(status: http::StatusCode, message: &str) -> Response;

    /// Creates a JSON error response carrying a machine-readable code.
    fn json_error(status: http::StatusCode, code: &str, message: &str) -> Response;

    /// Creates a response from pre-serialized JSON bytes.
    fn json(status: http::StatusCode, payload: Bytes) -> Response;
}

impl ResponseExt for Response {
    fn error(status: http::StatusCode, message: &str) -> Response {
        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Full::new(Bytes::from(message.to_string())))
            .expect("failed to build error response")
    }

    fn json_error(status: http::StatusCode, code: &str, message: &str) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": code,
                "message": message
            }
        });

        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .expect("failed to build JSON error response")
    }

    fn json(status: http::StatusCode, payload: Bytes) -> Response {
        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Full::new(payload))
            .expect("failed to build JSON response")
    }
}
