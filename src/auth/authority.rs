//! Identity Authority
//! Mission: Own password verification and token issuance/validation

use crate::auth::{
    credential_store::CredentialStore,
    jwt::JwtHandler,
    models::{Account, IssuedToken},
};
use crate::config::AuthorityConfig;
use crate::error::{ServiceError, ServiceResult, StoreError};
use anyhow::Context;
use bcrypt::{hash, verify};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct IdentityAuthority {
    store: Arc<dyn CredentialStore>,
    jwt: JwtHandler,
    bcrypt_cost: u32,
    // Verified against when the username is unknown so both login failures cost the same
    dummy_hash: String,
}

impl IdentityAuthority {
    pub fn new(store: Arc<dyn CredentialStore>, config: &AuthorityConfig) -> anyhow::Result<Self> {
        let dummy_hash = hash("callboard-dummy-password", config.bcrypt_cost)
            .context("Failed to prepare dummy password hash")?;

        Ok(Self {
            store,
            jwt: JwtHandler::new(&config.jwt_secret, config.token_ttl),
            bcrypt_cost: config.bcrypt_cost,
            dummy_hash,
        })
    }

    /// Create an account and sign its first token.
    pub async fn register(&self, username: &str, password: &str) -> ServiceResult<IssuedToken> {
        require_credentials(username, password)?;

        if self.store.get_by_username(username).await?.is_some() {
            warn!("❌ Registration rejected, username taken: {}", username);
            return Err(ServiceError::AlreadyExists);
        }

        let password_hash = self.hash_password(password).await?;

        // A concurrent registration can win the race past the lookup above
        let account = match self.store.create(username, &password_hash).await {
            Ok(account) => account,
            Err(StoreError::Conflict) => {
                warn!("❌ Registration lost race for username: {}", username);
                return Err(ServiceError::AlreadyExists);
            }
            Err(StoreError::Backend(e)) => return Err(e.context("Failed to insert account").into()),
        };

        info!("✅ Registered account: {} ({})", account.username, account.id);

        self.issue(&account)
    }

    /// Check a username/password pair and sign a token.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable.
    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<IssuedToken> {
        require_credentials(username, password)?;

        let account = self.store.get_by_username(username).await?;
        let stored_hash = account
            .as_ref()
            .map(|a| a.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.clone());

        let matches = self.verify_password(password, stored_hash).await?;

        match account {
            Some(account) if matches => {
                info!("✅ Login successful: {} ({})", account.username, account.id);
                self.issue(&account)
            }
            _ => {
                warn!("❌ Failed login attempt: {}", username);
                Err(ServiceError::InvalidCredentials)
            }
        }
    }

    /// Resolve a token to a live account id.
    ///
    /// The account is re-read on every call, so removing an account revokes
    /// every token it holds.
    pub async fn validate_token(&self, token: &str) -> ServiceResult<Uuid> {
        let account_id = match self.jwt.validate_token(token) {
            Ok(id) => id,
            Err(e) => {
                debug!("Token rejected: {:#}", e);
                return Err(ServiceError::Unauthenticated);
            }
        };

        match self.store.get_by_id(account_id).await? {
            Some(account) => Ok(account.id),
            None => {
                debug!("Token subject {} no longer exists", account_id);
                Err(ServiceError::Unauthenticated)
            }
        }
    }

    fn issue(&self, account: &Account) -> ServiceResult<IssuedToken> {
        let token = self.jwt.generate_token(account.id)?;
        Ok(IssuedToken {
            token,
            account_id: account.id,
            expires_in: self.jwt.ttl().as_secs(),
        })
    }

    // bcrypt blocks; run it on the blocking pool
    async fn hash_password(&self, password: &str) -> ServiceResult<String> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        let hashed = tokio::task::spawn_blocking(move || hash(password, cost))
            .await
            .context("Password hashing task failed")?
            .context("Failed to hash password")?;
        Ok(hashed)
    }

    async fn verify_password(&self, password: &str, stored_hash: String) -> ServiceResult<bool> {
        let password = password.to_string();
        let valid = tokio::task::spawn_blocking(move || verify(password, &stored_hash))
            .await
            .context("Password verification task failed")?
            .context("Failed to verify password")?;
        Ok(valid)
    }
}

fn require_credentials(username: &str, password: &str) -> ServiceResult<()> {
    if username.is_empty() || password.is_empty() {
        return Err(ServiceError::InvalidArgument(
            "username and password are required".to_string(),
        ));
    }
    Ok(())
}
