//! HTTP API: routing, bearer auth and request/response mapping.

pub mod app;
pub mod context;
pub mod middleware;
