use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{
    DeleteMealPlanResponse, MealPlanCountResponse, MealPlanListResponse, RenameMealPlanRequest,
    SaveMealPlanRequest, SaveMealPlanResponse,
};
use super::services;
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/save-meal-plan", post(save_meal_plan))
        .route("/get-saved-meal-plans/:username", get(get_saved_meal_plans))
        .route("/get-saved-meal-plans/:username/count", get(count_saved_meal_plans))
        .route(
            "/saved-meal-plans/:username/:plan_id",
            patch(rename_meal_plan).delete(delete_meal_plan),
        )
}

#[instrument(skip(state, payload), fields(user_id = %payload.user_id, chars = payload.meal_plan_content.len()))]
pub async fn save_meal_plan(
    State(state): State<AppState>,
    Json(payload): Json<SaveMealPlanRequest>,
) -> Result<Json<SaveMealPlanResponse>, AppError> {
    let meal_plan = services::save_meal_plan(&state, payload).await?;
    Ok(Json(SaveMealPlanResponse {
        success: true,
        meal_plan,
    }))
}

#[instrument(skip(state))]
pub async fn get_saved_meal_plans(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<MealPlanListResponse>, AppError> {
    let meal_plans = services::list_meal_plans(&state, &username).await?;
    Ok(Json(MealPlanListResponse {
        success: true,
        meal_plans,
    }))
}

#[instrument(skip(state))]
pub async fn count_saved_meal_plans(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<MealPlanCountResponse>, AppError> {
    let count = services::count_meal_plans(&state, &username).await?;
    Ok(Json(MealPlanCountResponse { success: true, count }))
}

#[instrument(skip(state, payload))]
pub async fn rename_meal_plan(
    State(state): State<AppState>,
    Path((username, plan_id)): Path<(String, String)>,
    Json(payload): Json<RenameMealPlanRequest>,
) -> Result<Json<SaveMealPlanResponse>, AppError> {
    let meal_plan = services::rename_meal_plan(&state, &username, &plan_id, &payload.new_name).await?;
    Ok(Json(SaveMealPlanResponse {
        success: true,
        meal_plan,
    }))
}

#[instrument(skip(state))]
pub async fn delete_meal_plan(
    State(state): State<AppState>,
    Path((username, plan_id)): Path<(String, String)>,
) -> Result<Json<DeleteMealPlanResponse>, AppError> {
    let deleted = services::delete_meal_plan(&state, &username, &plan_id).await?;
    Ok(Json(DeleteMealPlanResponse {
        success: true,
        deleted,
    }))
}
