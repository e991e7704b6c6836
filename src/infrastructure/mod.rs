//! Infrastructure layer - External service implementations

pub mod cache;
pub mod fetch;
pub mod http;
pub mod logging;
pub mod observability;
pub mod services;
