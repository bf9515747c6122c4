//! Authentication API Endpoints
//! Mission: Expose register, login and token validation over HTTP

use crate::auth::{
    authority::IdentityAuthority,
    models::{AuthResponse, CredentialsRequest, ValidateTokenRequest, ValidateTokenResponse},
};
use crate::error::ServiceError;
use crate::middleware::request_logging;
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub authority: Arc<IdentityAuthority>,
}

/// Router served by the auth-service binary
pub fn authority_router(authority: Arc<IdentityAuthority>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/validate", post(validate_token))
        .layer(middleware::from_fn(request_logging))
        .with_state(AuthState { authority })
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AuthState>,
    WithRejection(Json(payload), _): WithRejection<Json<CredentialsRequest>, ServiceError>,
) -> Result<(StatusCode, Json<AuthResponse>), ServiceError> {
    info!("🔐 Registration attempt: {}", payload.username);

    let issued = state
        .authority
        .register(&payload.username, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(issued.into())))
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    WithRejection(Json(payload), _): WithRejection<Json<CredentialsRequest>, ServiceError>,
) -> Result<Json<AuthResponse>, ServiceError> {
    info!("🔐 Login attempt: {}", payload.username);

    let issued = state
        .authority
        .login(&payload.username, &payload.password)
        .await?;

    Ok(Json(issued.into()))
}

/// Validate endpoint - POST /api/auth/validate
///
/// A bad token is an ordinary `valid: false` answer. Store failures still
/// surface as 500 so callers can tell "rejected" from "could not check".
pub async fn validate_token(
    State(state): State<AuthState>,
    WithRejection(Json(payload), _): WithRejection<Json<ValidateTokenRequest>, ServiceError>,
) -> Result<Json<ValidateTokenResponse>, ServiceError> {
    if payload.token.is_empty() {
        return Err(ServiceError::InvalidArgument("token is required".to_string()));
    }

    match state.authority.validate_token(&payload.token).await {
        Ok(account_id) => Ok(Json(ValidateTokenResponse::valid(account_id))),
        Err(ServiceError::Internal(e)) => Err(ServiceError::Internal(e)),
        Err(_) => Ok(Json(ValidateTokenResponse::invalid())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::credential_store::SqliteCredentialStore;
    use crate::config::AuthorityConfig;
    use axum::{body::Body, http::Request};
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    const TEST_BCRYPT_COST: u32 = 4;

    fn test_router() -> Router {
        let store = Arc::new(SqliteCredentialStore::in_memory().unwrap());
        let config = AuthorityConfig::new("test-secret-key-12345")
            .unwrap()
            .with_bcrypt_cost(TEST_BCRYPT_COST);
        let authority = Arc::new(IdentityAuthority::new(store, &config).unwrap());
        authority_router(authority)
    }

    async fn post_json(router: &Router, uri: &str, body: Value) -> (StatusCode, Vec<u8>) {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    fn parse<T: DeserializeOwned>(bytes: &[u8]) -> T {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_register_login_validate_flow() {
        let router = test_router();
        let creds = json!({"username": "alice", "password": "pw1"});

        let (status, body) = post_json(&router, "/api/auth/register", creds.clone()).await;
        assert_eq!(status, StatusCode::CREATED);
        let registered: AuthResponse = parse(&body);
        assert_eq!(registered.expires_in, 24 * 3600);

        let (status, body) = post_json(&router, "/api/auth/login", creds).await;
        assert_eq!(status, StatusCode::OK);
        let logged_in: AuthResponse = parse(&body);
        assert_eq!(logged_in.user_id, registered.user_id);

        let (status, body) = post_json(
            &router,
            "/api/auth/validate",
            json!({"token": logged_in.token}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let answer: ValidateTokenResponse = parse(&body);
        assert!(answer.valid);
        assert_eq!(answer.user_id, registered.user_id);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let router = test_router();
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/register")
                    .header("Content-Type", "application/json")
                    .body(Body::from("{\"username\": \"alice\""))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let error: Value = parse(&bytes);
        assert!(error["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_register_is_conflict() {
        let router = test_router();
        let creds = json!({"username": "alice", "password": "pw1"});

        post_json(&router, "/api/auth/register", creds.clone()).await;
        let (status, body) = post_json(&router, "/api/auth/register", creds).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let error: Value = parse(&body);
        assert_eq!(error["error"], "user already exists");
    }

    #[tokio::test]
    async fn test_bad_login_is_unauthorized() {
        let router = test_router();
        post_json(
            &router,
            "/api/auth/register",
            json!({"username": "alice", "password": "pw1"}),
        )
        .await;

        let (wrong_status, wrong_body) = post_json(
            &router,
            "/api/auth/login",
            json!({"username": "alice", "password": "nope"}),
        )
        .await;
        let (unknown_status, unknown_body) = post_json(
            &router,
            "/api/auth/login",
            json!({"username": "mallory", "password": "pw1"}),
        )
        .await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_body, unknown_body);
    }

    #[tokio::test]
    async fn test_missing_fields_are_bad_request() {
        let router = test_router();

        let (status, _) =
            post_json(&router, "/api/auth/register", json!({"username": "alice"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post_json(&router, "/api/auth/validate", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_token_is_valid_false() {
        let router = test_router();

        let (status, body) =
            post_json(&router, "/api/auth/validate", json!({"token": "garbage"})).await;
        assert_eq!(status, StatusCode::OK);
        let answer: ValidateTokenResponse = parse(&body);
        assert!(!answer.valid);
        assert!(answer.user_id.is_empty());
    }
}
