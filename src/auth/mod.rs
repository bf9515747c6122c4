//! Authentication Module
//! Mission: Issue and verify bearer tokens, and gate protected routes on them

pub mod api;
pub mod authority;
pub mod client;
pub mod credential_store;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod resolver;

pub use api::{authority_router, AuthState};
pub use authority::IdentityAuthority;
pub use client::RemoteAuthority;
pub use credential_store::{CredentialStore, SqliteCredentialStore};
pub use jwt::JwtHandler;
pub use middleware::{auth_middleware, AuthGate, CallerId};
pub use resolver::{AuthorityClient, IdentityResolver};
