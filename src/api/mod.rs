//! API layer - HTTP endpoints and middleware

pub mod cached;
pub mod health;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
pub mod types;

pub use cached::{CachedResponse, CachedRoute, X_CACHE};
pub use middleware::RequireSession;
pub use router::{create_router, create_router_with_state, create_server_router};
pub use state::AppState;
