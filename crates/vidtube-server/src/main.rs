mod config;

use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use vidtube_api::AppStateInner;
use vidtube_api::media::MediaHost;
use vidtube_api::tokens::TokenConfig;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidtube=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env();
    if config.uses_dev_secrets() {
        warn!("ACCESS_TOKEN_SECRET / REFRESH_TOKEN_SECRET not set, using development placeholders");
    }

    // Init database
    let db = vidtube_db::Database::open(&config.db_path)?;

    let tokens = TokenConfig {
        access_secret: config.access_token_secret.clone(),
        access_ttl: chrono::Duration::minutes(config.access_token_expiry_minutes),
        refresh_secret: config.refresh_token_secret.clone(),
        refresh_ttl: chrono::Duration::hours(config.refresh_token_expiry_hours),
    };

    let media = match config.cloudinary.clone() {
        Some(cloudinary) => MediaHost::cloudinary(cloudinary)?,
        None => {
            tokio::fs::create_dir_all(&config.media_dir).await?;
            MediaHost::local(config.media_dir.clone(), config.public_base_url.clone())
        }
    };

    let state = AppStateInner::new(db, tokens, media);

    let mut app = vidtube_api::router(state);
    if config.cloudinary.is_none() {
        app = app.nest_service("/media", ServeDir::new(&config.media_dir));
    }

    let app = app
        .layer(DefaultBodyLimit::max(config.max_upload_mb * 1024 * 1024))
        .layer(cors_layer(&config)?)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("VidTube server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Cookies are used for auth, so a configured origin gets credentials.
/// Without one, any origin is allowed and credentials are not.
fn cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let Some(origin) = &config.cors_origin else {
        return Ok(CorsLayer::permissive());
    };

    Ok(CorsLayer::new()
        .allow_origin(origin.parse::<HeaderValue>()?)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
