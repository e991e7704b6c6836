//! Security middleware for HTTP headers and request validation

use axum::{
    body::Body,
    http::{HeaderValue, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::types::ApiError;

/// Maximum request body size (64 KB); only preference documents are uploaded
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Middleware to add security headers to all responses
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    // Prevent MIME type sniffing
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    // Prevent clickjacking
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    // API responses are data only
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );

    // Cached routes set their own Cache-Control
    if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    response
}

/// Middleware rejecting request paths that could escape a route's prefix
pub async fn path_guard_middleware(request: Request<Body>, next: Next) -> Response {
    if let Err(e) = validate_request_security(request.uri().path()) {
        return e.into_response();
    }

    next.run(request).await
}

/// Validate request for common security issues
pub fn validate_request_security(path: &str) -> Result<(), SecurityValidationError> {
    // Check for path traversal attempts
    if path.contains("..") || path.contains("//") {
        return Err(SecurityValidationError::PathTraversal);
    }

    // Null bytes (raw or percent-encoded)
    if path.contains('\0') || path.to_ascii_lowercase().contains("%00") {
        return Err(SecurityValidationError::InvalidCharacters);
    }

    Ok(())
}

/// Security validation error
#[derive(Debug, PartialEq, Eq)]
pub enum SecurityValidationError {
    PathTraversal,
    InvalidCharacters,
}

impl IntoResponse for SecurityValidationError {
    fn into_response(self) -> Response {
        let message = match self {
            SecurityValidationError::PathTraversal => "Invalid path: path traversal detected",
            SecurityValidationError::InvalidCharacters => "Invalid request: prohibited characters",
        };

        ApiError::bad_request(message).into_response()
    }
}
