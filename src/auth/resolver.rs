//! Identity Resolution
//! Mission: The one capability the authorization gate needs from the authority

use crate::auth::{authority::IdentityAuthority, models::IssuedToken};
use crate::error::ServiceResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Turns a bearer token into the account id it speaks for.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> ServiceResult<Uuid>;
}

/// Full authority surface as seen by the call service: token resolution
/// plus the register/login calls it forwards for its own clients.
#[async_trait]
pub trait AuthorityClient: IdentityResolver {
    async fn register(&self, username: &str, password: &str) -> ServiceResult<IssuedToken>;

    async fn login(&self, username: &str, password: &str) -> ServiceResult<IssuedToken>;
}

#[async_trait]
impl IdentityResolver for IdentityAuthority {
    async fn resolve(&self, token: &str) -> ServiceResult<Uuid> {
        self.validate_token(token).await
    }
}

#[async_trait]
impl AuthorityClient for IdentityAuthority {
    async fn register(&self, username: &str, password: &str) -> ServiceResult<IssuedToken> {
        IdentityAuthority::register(self, username, password).await
    }

    async fn login(&self, username: &str, password: &str) -> ServiceResult<IssuedToken> {
        IdentityAuthority::login(self, username, password).await
    }
}
