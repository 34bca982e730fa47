//! dotgate observability API
//!
//! Metrics and health over HTTP. Nothing here is required for forwarding
//! correctness; the relay keeps running if this surface never comes up.
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_api_routes;
pub use state::AppState;
