//! JWT Token Handler
//! Mission: Sign and verify time-bounded account tokens

use crate::auth::models::Claims;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// HS256 signer bound to one process-wide secret.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtHandler {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generate a token for an account, expiring `ttl` from now
    pub fn generate_token(&self, account_id: Uuid) -> Result<String> {
        self.generate_token_at(account_id, Utc::now())
    }

    /// Generate a token as if issued at `issued_at`
    pub fn generate_token_at(&self, account_id: Uuid, issued_at: DateTime<Utc>) -> Result<String> {
        let ttl = chrono::Duration::from_std(self.ttl).context("Invalid token lifetime")?;
        let expiration = issued_at
            .checked_add_signed(ttl)
            .context("Invalid timestamp")?
            .timestamp();

        let claims = Claims {
            sub: account_id.to_string(),
            exp: expiration,
            iat: issued_at.timestamp(),
        };

        debug!(
            "Generating JWT for account {}, expires in {}s",
            account_id,
            self.ttl.as_secs()
        );

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to generate JWT")
    }

    /// Verify signature and expiry, returning the subject account id
    pub fn validate_token(&self, token: &str) -> Result<Uuid> {
        let decoded = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .context("Invalid or expired token")?;

        // jsonwebtoken accepts exp == now; a token is only valid strictly before expiry
        if decoded.claims.exp <= Utc::now().timestamp() {
            return Err(anyhow!("Token expired"));
        }

        let account_id =
            Uuid::parse_str(&decoded.claims.sub).context("Token subject is not an account id")?;

        debug!("Validated JWT for account {}", account_id);

        Ok(account_id)
    }
}
