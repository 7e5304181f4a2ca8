//! Composed cache-aside route.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/mix", get(mix))
}

fn default_id() -> i64 {
    1
}

#[derive(Deserialize)]
struct MixParams {
    #[serde(default = "default_id")]
    id: i64,
}

#[derive(Serialize)]
struct MixResponse {
    data: String,
}

/// GET /mix - read-through: cache hit, or store read plus populate
async fn mix(
    State(state): State<AppState>,
    Query(params): Query<MixParams>,
) -> ApiResult<Json<MixResponse>> {
    if params.id < 1 {
        return Err(ApiError::BadRequest("bad id".into()));
    }
    let data = state.reader().read(params.id).await?;
    Ok(Json(MixResponse { data }))
}
