//! Remote Authority Client
//!
//! Reaches the auth-service over HTTP. Every request carries the client-wide
//! timeout, so a stalled authority can never hold a call-service request open.

use crate::auth::{
    models::{
        AuthResponse, CredentialsRequest, IssuedToken, ValidateTokenRequest,
        ValidateTokenResponse,
    },
    resolver::{AuthorityClient, IdentityResolver},
};
use crate::error::{ServiceError, ServiceResult};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct RemoteAuthority {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl RemoteAuthority {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("Failed to build RemoteAuthority client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[inline]
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn credentials_call(
        &self,
        path: &str,
        username: &str,
        password: &str,
    ) -> ServiceResult<IssuedToken> {
        let body = CredentialsRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", path))?;

        let status = resp.status();
        if status.is_success() {
            let auth = resp
                .json::<AuthResponse>()
                .await
                .context("Failed to parse authority response")?;
            let account_id =
                Uuid::parse_str(&auth.user_id).context("Authority returned a bad account id")?;
            return Ok(IssuedToken {
                token: auth.token,
                account_id,
                expires_in: auth.expires_in,
            });
        }

        match status {
            StatusCode::CONFLICT => Err(ServiceError::AlreadyExists),
            StatusCode::UNAUTHORIZED => Err(ServiceError::InvalidCredentials),
            StatusCode::BAD_REQUEST => {
                let message = resp
                    .json::<ErrorBody>()
                    .await
                    .map(|b| b.error)
                    .unwrap_or_else(|_| "invalid request".to_string());
                Err(ServiceError::InvalidArgument(message))
            }
            other => Err(anyhow!("POST {} returned {}", path, other).into()),
        }
    }

    async fn validate(&self, token: &str) -> anyhow::Result<ValidateTokenResponse> {
        let resp = self
            .client
            .post(self.url("/api/auth/validate"))
            .json(&ValidateTokenRequest {
                token: token.to_string(),
            })
            .send()
            .await
            .context("POST /api/auth/validate failed")?;

        if !resp.status().is_success() {
            return Err(anyhow!("POST /api/auth/validate returned {}", resp.status()));
        }

        resp.json::<ValidateTokenResponse>()
            .await
            .context("Failed to parse validation response")
    }
}

#[async_trait]
impl IdentityResolver for RemoteAuthority {
    async fn resolve(&self, token: &str) -> ServiceResult<Uuid> {
        let answer = match self.validate(token).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Token validation call failed: {:#}", e);
                return Err(ServiceError::Unauthenticated);
            }
        };

        if !answer.valid {
            debug!("Authority rejected token");
            return Err(ServiceError::Unauthenticated);
        }

        Uuid::parse_str(&answer.user_id).map_err(|_| ServiceError::Unauthenticated)
    }
}

#[async_trait]
impl AuthorityClient for RemoteAuthority {
    async fn register(&self, username: &str, password: &str) -> ServiceResult<IssuedToken> {
        self.credentials_call("/api/auth/register", username, password)
            .await
    }

    async fn login(&self, username: &str, password: &str) -> ServiceResult<IssuedToken> {
        self.credentials_call("/api/auth/login", username, password)
            .await
    }
}
