use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    routing::post,
    Json, Router,
};
use tracing::instrument;

use super::dto::{FoodNameQuery, IngredientResponse, MacroAnalysisResponse};
use super::services;
use crate::{error::AppError, images::ImageUpload, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/identify-ingredients", post(identify_ingredients))
        .route("/analyze-food-macros", post(analyze_food_macros))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

/// POST /identify-ingredients (multipart `file`)
#[instrument(skip(state, mp))]
pub async fn identify_ingredients(
    State(state): State<AppState>,
    mp: Multipart,
) -> Result<Json<IngredientResponse>, AppError> {
    let upload = ImageUpload::from_multipart(mp).await?;
    let ingredients = services::identify_ingredients(&state, upload).await?;
    Ok(Json(IngredientResponse {
        success: true,
        ingredients,
    }))
}

/// POST /analyze-food-macros (multipart `file`, `food_name` as field or query)
#[instrument(skip(state, mp))]
pub async fn analyze_food_macros(
    State(state): State<AppState>,
    Query(q): Query<FoodNameQuery>,
    mp: Multipart,
) -> Result<Json<MacroAnalysisResponse>, AppError> {
    let upload = ImageUpload::from_multipart(mp).await?;
    let food_name = upload.fields.get("food_name").cloned().or(q.food_name);
    let analysis = services::analyze_macros(&state, upload, food_name.as_deref()).await?;
    Ok(Json(MacroAnalysisResponse {
        success: true,
        macros: analysis.macros,
        degraded: analysis.degraded,
    }))
}
