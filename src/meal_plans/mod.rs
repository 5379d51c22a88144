pub mod dto;
pub mod handlers;
pub mod repo;
mod services;

pub use repo::MealPlanStore;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
