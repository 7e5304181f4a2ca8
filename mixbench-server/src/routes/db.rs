//! Record store routes.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use mixbench_core::Record;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/db/one", get(get_one))
        .route("/db/insert", post(insert))
}

fn default_id() -> i64 {
    1
}

#[derive(Deserialize)]
struct GetOneParams {
    #[serde(default = "default_id")]
    id: i64,
}

/// GET /db/one - point lookup by id; 404 when no row matches
async fn get_one(
    State(state): State<AppState>,
    Query(params): Query<GetOneParams>,
) -> ApiResult<Json<Record>> {
    if params.id < 1 {
        return Err(ApiError::BadRequest("bad id".into()));
    }
    let record = state.store().get_one(params.id).await?;
    record.map(Json).ok_or(ApiError::NotFound)
}

#[derive(Deserialize)]
struct InsertParams {
    data: Option<String>,
}

#[derive(Serialize)]
struct InsertResponse {
    id: i64,
}

/// POST /db/insert - insert a payload taken from `?data=`, the raw body,
/// or the default filler, in that order
async fn insert(
    State(state): State<AppState>,
    Query(params): Query<InsertParams>,
    body: String,
) -> ApiResult<Json<InsertResponse>> {
    let payload = insert_payload(params.data, body);
    let id = state.store().insert(&payload).await?;
    Ok(Json(InsertResponse { id }))
}

fn insert_payload(data: Option<String>, body: String) -> String {
    match data {
        Some(data) => data,
        None if !body.is_empty() => body,
        None => "x".repeat(64),
    }
}
