//! API middleware components

pub mod logging;
pub mod metrics;
pub mod security;
pub mod session;

pub use logging::logging_middleware;
pub use metrics::metrics_middleware;
pub use security::{
    MAX_BODY_SIZE, path_guard_middleware, security_headers_middleware, validate_request_security,
};
pub use session::{RequireSession, extract_session_id};
