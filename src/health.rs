use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{error::AppError, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

async fn root() -> Json<Value> {
    Json(json!({ "status": "API is running" }))
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(anyhow::Error::from)?;
    Ok(Json(json!({
        "status": "healthy",
        "timestamp": timestamp,
        "agents_available": state.retriever.is_some(),
    })))
}
