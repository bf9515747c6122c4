//! Callboard Backend Library
//!
//! Two services share this crate: the identity authority (auth-service)
//! and the call tracker it protects (call-service).

pub mod auth;
pub mod calls;
pub mod config;
pub mod error;
pub mod middleware;
