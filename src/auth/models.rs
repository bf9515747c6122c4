//! Authentication Models
//! Mission: Define account and credential data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub created_at: DateTime<Utc>,
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (account id)
    pub exp: i64,    // expiration timestamp
    pub iat: i64,
}

/// A freshly signed token together with the account it speaks for
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub account_id: Uuid,
    pub expires_in: u64, // seconds until expiration
}

/// Register / login request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Register / login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub expires_in: u64,
}

impl From<IssuedToken> for AuthResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            user_id: issued.account_id.to_string(),
            expires_in: issued.expires_in,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateTokenRequest {
    #[serde(default)]
    pub token: String,
}

/// Token validation answer. Invalid tokens are a normal `valid: false`
/// response rather than an HTTP error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateTokenResponse {
    pub valid: bool,
    pub user_id: String,
}

impl ValidateTokenResponse {
    pub fn valid(account_id: Uuid) -> Self {
        Self {
            valid: true,
            user_id: account_id.to_string(),
        }
    }

    pub fn invalid() -> Self {
        Self {
            valid: false,
            user_id: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_never_serialized() {
        let account = Account {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&account).unwrap();
        assert!(json.contains("alice"));
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("$2b$04$secret"));
    }

    #[test]
    fn test_missing_credentials_fields_default_to_empty() {
        let req: CredentialsRequest = serde_json::from_str(r#"{"username":"bob"}"#).unwrap();
        assert_eq!(req.username, "bob");
        assert!(req.password.is_empty());
    }

    #[test]
    fn test_invalid_validation_response_has_empty_id() {
        let resp = ValidateTokenResponse::invalid();
        assert!(!resp.valid);
        assert!(resp.user_id.is_empty());
    }
}
