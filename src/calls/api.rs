//! Call API Endpoints
//! Mission: HTTP surface of the call service

use crate::auth::{
    api::health_check,
    middleware::{auth_middleware, AuthGate, CallerId},
    models::{AuthResponse, CredentialsRequest},
    resolver::AuthorityClient,
};
use crate::calls::{
    models::{Call, CreateCallRequest, UpdateCallStatusRequest},
    service::CallService,
};
use crate::error::{ServiceError, ServiceResult};
use crate::middleware::request_logging;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Shared call-service state
#[derive(Clone)]
pub struct CallState {
    pub calls: CallService,
    pub authority: Arc<dyn AuthorityClient>,
}

/// Router served by the call-service binary.
///
/// `authority` is used both for the gate and for forwarding register/login;
/// it may be the in-process authority or a `RemoteAuthority`.
pub fn call_router<A>(calls: CallService, authority: Arc<A>, auth_timeout: Duration) -> Router
where
    A: AuthorityClient + 'static,
{
    let gate = AuthGate::new(authority.clone(), auth_timeout);
    let state = CallState { calls, authority };

    let protected_routes = Router::new()
        .route("/api/calls", post(create_call).get(list_calls))
        .route("/api/calls/:id", get(get_call).delete(delete_call))
        .route("/api/calls/:id/status", patch(update_call_status))
        .route_layer(middleware::from_fn_with_state(gate, auth_middleware));

    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(request_logging))
        .with_state(state)
}

fn parse_call_id(raw: &str) -> ServiceResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ServiceError::InvalidArgument("invalid call ID".to_string()))
}

/// POST /api/auth/register, forwarded to the authority
async fn register(
    State(state): State<CallState>,
    WithRejection(Json(payload), _): WithRejection<Json<CredentialsRequest>, ServiceError>,
) -> ServiceResult<(StatusCode, Json<AuthResponse>)> {
    let issued = state
        .authority
        .register(&payload.username, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(issued.into())))
}

/// POST /api/auth/login, forwarded to the authority
async fn login(
    State(state): State<CallState>,
    WithRejection(Json(payload), _): WithRejection<Json<CredentialsRequest>, ServiceError>,
) -> ServiceResult<Json<AuthResponse>> {
    let issued = state
        .authority
        .login(&payload.username, &payload.password)
        .await?;
    Ok(Json(issued.into()))
}

/// POST /api/calls
async fn create_call(
    State(state): State<CallState>,
    Extension(CallerId(caller)): Extension<CallerId>,
    WithRejection(Json(payload), _): WithRejection<Json<CreateCallRequest>, ServiceError>,
) -> ServiceResult<(StatusCode, Json<Call>)> {
    if let Some(field) = payload.missing_field() {
        return Err(ServiceError::InvalidArgument(format!("{} is required", field)));
    }

    let call = state.calls.create(payload, caller).await?;
    Ok((StatusCode::CREATED, Json(call)))
}

/// GET /api/calls
async fn list_calls(
    State(state): State<CallState>,
    Extension(CallerId(caller)): Extension<CallerId>,
) -> ServiceResult<Json<Vec<Call>>> {
    Ok(Json(state.calls.list(caller).await?))
}

/// GET /api/calls/:id
async fn get_call(
    State(state): State<CallState>,
    Extension(CallerId(caller)): Extension<CallerId>,
    Path(id): Path<String>,
) -> ServiceResult<Json<Call>> {
    let id = parse_call_id(&id)?;
    Ok(Json(state.calls.get(id, caller).await?))
}

/// PATCH /api/calls/:id/status
async fn update_call_status(
    State(state): State<CallState>,
    Extension(CallerId(caller)): Extension<CallerId>,
    Path(id): Path<String>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateCallStatusRequest>, ServiceError>,
) -> ServiceResult<Json<Value>> {
    let id = parse_call_id(&id)?;
    if payload.status.is_empty() {
        return Err(ServiceError::InvalidArgument("status is required".to_string()));
    }

    state.calls.update_status(id, &payload.status, caller).await?;
    Ok(Json(json!({ "message": "status updated successfully" })))
}

/// DELETE /api/calls/:id
async fn delete_call(
    State(state): State<CallState>,
    Extension(CallerId(caller)): Extension<CallerId>,
    Path(id): Path<String>,
) -> ServiceResult<Json<Value>> {
    let id = parse_call_id(&id)?;
    state.calls.delete(id, caller).await?;
    Ok(Json(json!({ "message": "call deleted successfully" })))
}
