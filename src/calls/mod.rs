//! Calls Module
//! Mission: Per-owner call records behind the authorization gate

pub mod api;
pub mod models;
pub mod service;
pub mod store;

pub use api::{call_router, CallState};
pub use models::{Call, CallStatus};
pub use service::CallService;
pub use store::{CallStore, SqliteCallStore};
