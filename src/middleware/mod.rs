//! Middleware for observability.
//!
//! Request logging with request ids and latency, shared by both services.

pub mod logging;

pub use logging::request_logging;
