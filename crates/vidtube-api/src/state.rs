use std::sync::Arc;
use std::time::Instant;

use tracing::error;

use vidtube_db::Database;

use crate::error::ApiError;
use crate::media::MediaHost;
use crate::tokens::TokenConfig;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenConfig,
    pub media: MediaHost,
    pub started_at: Instant,
}

impl AppStateInner {
    pub fn new(db: Database, tokens: TokenConfig, media: MediaHost) -> AppState {
        Arc::new(Self {
            db,
            tokens,
            media,
            started_at: Instant::now(),
        })
    }
}

/// Run a blocking store call off the async runtime.
pub async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    offload(move || f(&state.db)).await
}

/// Run CPU-heavy work, such as password hashing, on the blocking pool.
pub async fn offload<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal()
        })?
        .map_err(ApiError::from)
}
