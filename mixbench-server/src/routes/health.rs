//! Liveness route.

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ping", get(ping))
}

#[derive(Serialize)]
struct PingResponse {
    ok: bool,
}

/// GET /ping - liveness probe; touches no backend
async fn ping() -> Json<PingResponse> {
    Json(PingResponse { ok: true })
}
