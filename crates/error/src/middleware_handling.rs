use axum::{
    Json,
    body::Body,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::ErrorResponse;

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Rewrites bodies produced outside the handlers (panics, timeouts, body limit)
/// into the standard error shape. JSON responses pass through untouched.
pub async fn error_handling_middleware(req: Request<Body>, next: Next) -> Response {
    let response = next.run(req).await;
    let status = response.status();

    if is_json(&response) {
        return response;
    }

    let (message, code) = match status {
        StatusCode::PAYLOAD_TOO_LARGE => (
            "The request body exceeds the maximum allowed size",
            "PAYLOAD_TOO_LARGE",
        ),
        StatusCode::REQUEST_TIMEOUT => ("The request took too long to complete", "TIMEOUT"),
        s if s.is_server_error() => ("Internal server error", "SERVER_ERROR"),
        _ => return response,
    };

    error!(status_code = %status.as_u16(), code, "Replacing non-JSON error response");
    (status, Json(ErrorResponse::new(status, message, code))).into_response()
}
