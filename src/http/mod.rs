//! HTTP surface: router, static assets, health

pub mod assets;
pub mod routes;

pub use routes::build_router;
