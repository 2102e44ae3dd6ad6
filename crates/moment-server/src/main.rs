use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use moment_api::{ApiConfig, AppState, AppStateInner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moments=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let host = std::env::var("MOMENTS_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("MOMENTS_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let db_path = std::env::var("MOMENTS_DB_PATH").unwrap_or_else(|_| "moments.db".into());

    let dashboard_password = std::env::var("MOMENTS_DASHBOARD_PASSWORD")
        .ok()
        .filter(|p| !p.is_empty());
    if dashboard_password.is_none() {
        warn!("MOMENTS_DASHBOARD_PASSWORD is not set; dashboard logins will fail with 500");
    }

    let twilio_auth_token = std::env::var("MOMENTS_TWILIO_AUTH_TOKEN")
        .ok()
        .filter(|t| !t.is_empty());
    if twilio_auth_token.is_none() {
        warn!("MOMENTS_TWILIO_AUTH_TOKEN is not set; carrier webhook runs unauthenticated");
    }

    let secure_cookies = std::env::var("MOMENTS_SECURE_COOKIES")
        .map(|v| v != "false" && v != "0")
        .unwrap_or(true);
    let rate_limit_max: u32 = std::env::var("MOMENTS_RATE_LIMIT_MAX")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3);
    let rate_limit_window_secs: i64 = std::env::var("MOMENTS_RATE_LIMIT_WINDOW_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3600);
    let rate_fallback_key =
        std::env::var("MOMENTS_RATE_FALLBACK_KEY").unwrap_or_else(|_| "unidentified".into());

    // Init database (messages + rate-limit counters)
    let db = moment_db::Database::open(&PathBuf::from(&db_path))?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        config: ApiConfig {
            dashboard_password,
            twilio_auth_token,
            secure_cookies,
            rate_limit_max,
            rate_limit_window_secs,
            rate_fallback_key,
        },
    });

    let app = moment_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Moments server listening on {}", addr);
    info!(
        "Rate limit: {} submissions per {} seconds",
        rate_limit_max, rate_limit_window_secs
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
