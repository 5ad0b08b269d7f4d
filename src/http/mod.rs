//! HTTP surface: websocket endpoint, health check and static assets

pub mod routes;

pub use routes::build_router;
