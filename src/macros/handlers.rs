use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{
    DayQuery, RangeQuery, SaveMacrosRequest, SaveMacrosResponse, UserMacrosResponse, WeeklyMacrosResponse,
};
use super::services::{into_record, resolve_range, summarize};
use crate::dates::{format_date, parse_date, today};
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/save-macros", post(save_macros))
        .route("/get-user-macros/:username", get(get_user_macros))
        .route("/get-user-weekly-macros/:username", get(get_user_weekly_macros))
}

#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn save_macros(
    State(state): State<AppState>,
    Json(payload): Json<SaveMacrosRequest>,
) -> Result<Json<SaveMacrosResponse>, AppError> {
    let record = into_record(payload, today())?;
    info!(
        meal = %record.meal_name,
        food = %record.food_name,
        date = %record.date_added,
        "saving macros"
    );
    state.macros.insert(&record).await?;
    info!(username = %record.username, "macros saved");
    Ok(Json(SaveMacrosResponse {
        success: true,
        message: "Macros saved successfully".into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_user_macros(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(q): Query<DayQuery>,
) -> Result<Json<UserMacrosResponse>, AppError> {
    let date = match q.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => Some(format_date(parse_date(raw)?)),
        None => None,
    };
    let macros = state.macros.for_user(&username, date.as_deref()).await?;
    info!(entries = macros.len(), "macros fetched");
    Ok(Json(UserMacrosResponse {
        success: true,
        macros,
    }))
}

#[instrument(skip(state))]
pub async fn get_user_weekly_macros(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(q): Query<RangeQuery>,
) -> Result<Json<WeeklyMacrosResponse>, AppError> {
    let (start, end) = resolve_range(q.start_date.as_deref(), q.end_date.as_deref(), today())?;
    info!(start = %start, end = %end, "date range");

    let entries = state.macros.for_range(&username, start, end).await?;
    info!(entries = entries.len(), "entries retrieved");

    Ok(Json(summarize(entries, start, end)))
}
