//! Call Service Binary
//!
//! Per-owner call tracking. Every `/api/calls` request is authenticated by
//! asking the auth-service to validate its bearer token.
//!
//! Environment:
//!   CALLS_DB_PATH - SQLite path for calls (default: calls.db)
//!   AUTH_SERVICE_URL - Base URL of the auth-service (default: http://localhost:50051)
//!   AUTH_TIMEOUT_MS - Deadline for each authority request (default: 5000)
//!   CALLS_BIND_ADDR - Listen address (default: 0.0.0.0:8080)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use callboard_backend::auth::RemoteAuthority;
use callboard_backend::calls::{call_router, CallService, SqliteCallStore};
use callboard_backend::config::{init_tracing, load_env, resolve_data_path};

#[derive(Parser, Debug)]
#[command(name = "call-service")]
#[command(about = "Call tracker - owner-scoped call records")]
struct Args {
    /// Call database path
    #[arg(long, env = "CALLS_DB_PATH", default_value = "calls.db")]
    db_path: String,

    /// Auth-service base URL
    #[arg(long, env = "AUTH_SERVICE_URL", default_value = "http://localhost:50051")]
    auth_service_url: String,

    /// Token validation deadline in milliseconds
    #[arg(long, env = "AUTH_TIMEOUT_MS", default_value = "5000")]
    auth_timeout_ms: u64,

    /// Listen address
    #[arg(long, env = "CALLS_BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind_addr: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let args = Args::parse();
    let auth_timeout = Duration::from_millis(args.auth_timeout_ms);

    info!("📞 Starting call-service");

    let db_path = resolve_data_path(&args.db_path);
    let store = Arc::new(
        SqliteCallStore::new(&db_path)
            .with_context(|| format!("Failed to open call store at {}", db_path))?,
    );
    info!("  Call store: {}", db_path);

    let authority = Arc::new(RemoteAuthority::new(&args.auth_service_url, auth_timeout)?);
    info!(
        "  Authority: {} (timeout {:?})",
        args.auth_service_url, auth_timeout
    );

    let app = call_router(CallService::new(store), authority, auth_timeout)
        .layer(CorsLayer::permissive());

    let listener = TcpListener::bind(&args.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind_addr))?;
    info!("🎯 call-service listening on {}", args.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
