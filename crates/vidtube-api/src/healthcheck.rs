use axum::{extract::State, response::Response};

use vidtube_types::api::HealthStatus;

use crate::extract::ok;
use crate::state::AppState;

pub async fn healthcheck(State(state): State<AppState>) -> Response {
    let status = HealthStatus {
        timestamp: chrono::Utc::now(),
        uptime: format!("{:.3} secs", state.started_at.elapsed().as_secs_f64()),
        version: env!("CARGO_PKG_VERSION"),
    };
    ok(status, "All Good!!")
}
