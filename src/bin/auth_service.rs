//! Auth Service Binary
//!
//! Identity authority: registers accounts, issues bearer tokens and answers
//! token validation for the call service.
//!
//! Environment:
//!   AUTH_DB_PATH - SQLite path for accounts (default: auth.db)
//!   JWT_SECRET - HS256 signing secret (required)
//!   AUTH_BIND_ADDR - Listen address (default: 0.0.0.0:50051)
//!   BCRYPT_COST - bcrypt work factor (default: bcrypt::DEFAULT_COST)

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use callboard_backend::auth::{authority_router, IdentityAuthority, SqliteCredentialStore};
use callboard_backend::config::{init_tracing, load_env, resolve_data_path, AuthorityConfig};

#[derive(Parser, Debug)]
#[command(name = "auth-service")]
#[command(about = "Identity authority - accounts and bearer tokens")]
struct Args {
    /// Account database path
    #[arg(long, env = "AUTH_DB_PATH", default_value = "auth.db")]
    db_path: String,

    /// Token signing secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Listen address
    #[arg(long, env = "AUTH_BIND_ADDR", default_value = "0.0.0.0:50051")]
    bind_addr: String,

    /// bcrypt cost factor
    #[arg(long, env = "BCRYPT_COST")]
    bcrypt_cost: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let args = Args::parse();

    info!("🔐 Starting auth-service");

    let mut config = AuthorityConfig::new(args.jwt_secret)?;
    if let Some(cost) = args.bcrypt_cost {
        config = config.with_bcrypt_cost(cost);
    }

    let db_path = resolve_data_path(&args.db_path);
    let store = Arc::new(
        SqliteCredentialStore::new(&db_path)
            .with_context(|| format!("Failed to open account store at {}", db_path))?,
    );
    info!("  Account store: {}", db_path);

    let authority = Arc::new(IdentityAuthority::new(store, &config)?);
    let app = authority_router(authority).layer(CorsLayer::permissive());

    let listener = TcpListener::bind(&args.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind_addr))?;
    info!("🎯 auth-service listening on {}", args.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
