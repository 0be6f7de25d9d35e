//! API module
//!
//! HTTP endpoints, precondition parsing and middleware.

pub mod conditions;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
