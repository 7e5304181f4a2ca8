//! Key-value cache routes.

use std::time::Duration;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cache/get", get(get_value))
        .route("/cache/set", get(set_value))
}

fn default_key() -> String {
    "k".into()
}

fn default_value() -> String {
    "v".into()
}

fn default_ttl() -> u64 {
    60
}

#[derive(Deserialize)]
struct GetParams {
    #[serde(default = "default_key")]
    key: String,
}

#[derive(Serialize)]
struct GetResponse {
    key: String,
    value: Option<String>,
}

/// GET /cache/get - look a key up; a null value is a normal miss
async fn get_value(
    State(state): State<AppState>,
    Query(params): Query<GetParams>,
) -> ApiResult<Json<GetResponse>> {
    let value = state.cache().get(&params.key).await?;
    Ok(Json(GetResponse {
        key: params.key,
        value,
    }))
}

#[derive(Deserialize)]
struct SetParams {
    #[serde(default = "default_key")]
    key: String,
    #[serde(default = "default_value")]
    value: String,
    #[serde(default = "default_ttl")]
    ttl: u64,
}

#[derive(Serialize)]
struct SetResponse {
    ok: bool,
}

/// GET /cache/set - unconditional overwrite with TTL. GET rather than
/// POST so every benchmark driver can hit it the same way.
async fn set_value(
    State(state): State<AppState>,
    Query(params): Query<SetParams>,
) -> ApiResult<Json<SetResponse>> {
    if params.ttl < 1 {
        return Err(ApiError::BadRequest("bad ttl".into()));
    }
    state
        .cache()
        .set(&params.key, &params.value, Duration::from_secs(params.ttl))
        .await?;
    Ok(Json(SetResponse { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_params_have_benchmark_defaults() {
        let params: SetParams = serde_json::from_str("{}").expect("params");
        assert_eq!(params.key, "k");
        assert_eq!(params.value, "v");
        assert_eq!(params.ttl, 60);
    }

    #[test]
    fn get_key_defaults_to_k() {
        let params: GetParams = serde_json::from_str("{}").expect("params");
        assert_eq!(params.key, "k");
    }
}
