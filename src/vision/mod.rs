mod dto;
pub mod handlers;
mod parsing;
mod prompts;
mod services;

pub(crate) use parsing::preview;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
