//! Authentication Middleware
//! Mission: Resolve every protected request's bearer token to a caller id

use crate::auth::resolver::IdentityResolver;
use crate::error::ServiceError;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// Account id of the authenticated caller, attached by `auth_middleware`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerId(pub Uuid);

/// Gate state: where to resolve tokens and how long to wait for an answer.
///
/// Results are never cached; each request pays one resolution.
#[derive(Clone)]
pub struct AuthGate {
    resolver: Arc<dyn IdentityResolver>,
    timeout: Duration,
}

impl AuthGate {
    pub fn new(resolver: Arc<dyn IdentityResolver>, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }

    /// Resolve a raw `Authorization` header value to a caller id.
    pub async fn authenticate(&self, header: Option<&str>) -> Result<CallerId, ServiceError> {
        let header = header.ok_or(ServiceError::Unauthenticated)?;
        let token = parse_bearer(header).ok_or_else(|| {
            debug!("Rejected malformed authorization header");
            ServiceError::Unauthenticated
        })?;

        // No time budget at all: fail without contacting the resolver
        if self.timeout.is_zero() {
            return Err(ServiceError::Unauthenticated);
        }

        let deadline = Instant::now() + self.timeout;
        match tokio::time::timeout_at(deadline, self.resolver.resolve(token)).await {
            Ok(Ok(account_id)) => Ok(CallerId(account_id)),
            Ok(Err(_)) => Err(ServiceError::Unauthenticated),
            Err(_) => {
                debug!("Token resolution timed out after {:?}", self.timeout);
                Err(ServiceError::Unauthenticated)
            }
        }
    }
}

/// Accepts exactly `Bearer <token>`: two space-separated parts, no extras.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || scheme != "Bearer" || token.is_empty() {
        return None;
    }
    Some(token)
}

/// Auth middleware that resolves bearer tokens through the gate
pub async fn auth_middleware(
    State(gate): State<AuthGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let caller = gate.authenticate(header).await?;

    // Handlers read the caller from request extensions
    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceResult;
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Extension, Router,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Resolver that accepts one token and counts every call it receives.
    struct StubResolver {
        token: &'static str,
        account_id: Uuid,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl StubResolver {
        fn new(token: &'static str) -> Self {
            Self {
                token,
                account_id: Uuid::new_v4(),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl IdentityResolver for StubResolver {
        async fn resolve(&self, token: &str) -> ServiceResult<Uuid> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if token == self.token {
                Ok(self.account_id)
            } else {
                Err(ServiceError::Unauthenticated)
            }
        }
    }

    fn gate(resolver: Arc<StubResolver>, timeout: Duration) -> AuthGate {
        AuthGate::new(resolver, timeout)
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_bearer("Bearer"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("bearer abc"), None);
        assert_eq!(parse_bearer("Basic abc"), None);
        assert_eq!(parse_bearer("Bearer abc def"), None);
        assert_eq!(parse_bearer("Bearer  abc"), None);
        assert_eq!(parse_bearer("abc"), None);
        assert_eq!(parse_bearer(""), None);
    }

    #[tokio::test]
    async fn test_malformed_header_never_reaches_resolver() {
        let resolver = Arc::new(StubResolver::new("good"));
        let gate = gate(resolver.clone(), Duration::from_secs(1));

        for header in [None, Some("good"), Some("Token good"), Some("Bearer good extra")] {
            assert!(matches!(
                gate.authenticate(header).await,
                Err(ServiceError::Unauthenticated)
            ));
        }
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_token_resolves_caller() {
        let resolver = Arc::new(StubResolver::new("good"));
        let gate = gate(resolver.clone(), Duration::from_secs(1));

        let caller = gate.authenticate(Some("Bearer good")).await.unwrap();
        assert_eq!(caller, CallerId(resolver.account_id));
    }

    #[tokio::test]
    async fn test_no_caching_between_requests() {
        let resolver = Arc::new(StubResolver::new("good"));
        let gate = gate(resolver.clone(), Duration::from_secs(1));

        gate.authenticate(Some("Bearer good")).await.unwrap();
        gate.authenticate(Some("Bearer good")).await.unwrap();
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejected_token_is_unauthenticated() {
        let resolver = Arc::new(StubResolver::new("good"));
        let gate = gate(resolver, Duration::from_secs(1));

        assert!(matches!(
            gate.authenticate(Some("Bearer bad")).await,
            Err(ServiceError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_slow_resolver_times_out() {
        let mut stub = StubResolver::new("good");
        stub.delay = Duration::from_secs(5);
        let gate = gate(Arc::new(stub), Duration::from_millis(50));

        let started = std::time::Instant::now();
        assert!(matches!(
            gate.authenticate(Some("Bearer good")).await,
            Err(ServiceError::Unauthenticated)
        ));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_zero_timeout_skips_resolver() {
        let resolver = Arc::new(StubResolver::new("good"));
        let gate = gate(resolver.clone(), Duration::ZERO);

        assert!(matches!(
            gate.authenticate(Some("Bearer good")).await,
            Err(ServiceError::Unauthenticated)
        ));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    async fn whoami(Extension(caller): Extension<CallerId>) -> String {
        caller.0.to_string()
    }

    #[tokio::test]
    async fn test_middleware_attaches_caller() {
        let resolver = Arc::new(StubResolver::new("good"));
        let account_id = resolver.account_id;
        let app = Router::new()
            .route("/whoami", get(whoami))
            .route_layer(middleware::from_fn_with_state(
                gate(resolver, Duration::from_secs(1)),
                auth_middleware,
            ));

        let response = app
            .clone()
            .oneshot(
                HttpRequest::builder()
                    .uri("/whoami")
                    .header("Authorization", "Bearer good")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, account_id.to_string().as_bytes());

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/whoami")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
