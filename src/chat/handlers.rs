use axum::{extract::State, routing::post, Json, Router};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::instrument;

use super::dto::{ChatRequest, ChatResponse};
use super::services;
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}

#[instrument(skip(state, payload), fields(user_id = %payload.user_id, initial = payload.is_initial_message))]
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = services::reply(&state, &payload).await?;
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(anyhow::Error::from)?;
    Ok(Json(ChatResponse::new(message, timestamp)))
}
