use tracing::info;

use super::dto::ChatRequest;
use crate::agents::Dispatcher;
use crate::error::AppError;
use crate::state::AppState;
use crate::vision::preview;

pub const AGENTS_UNAVAILABLE: &str = "I'm sorry, but the meal planning assistant is not \
available at the moment. The required dependencies are missing.";

/// Structured fields of a session's first message, as the planner expects them.
pub fn initial_preamble(req: &ChatRequest) -> String {
    fn list(items: &Option<Vec<String>>, empty: &str) -> String {
        match items {
            Some(items) if !items.is_empty() => items.join(", "),
            _ => empty.to_string(),
        }
    }
    let protein = req
        .protein_target
        .filter(|p| *p > 0)
        .map_or_else(|| "Not specified".to_string(), |p| p.to_string());
    format!(
        "Ingredients: {}\nDietary Restrictions: {}\nAllergy Information: {}\nDaily Protein Target: {} grams",
        list(&req.ingredients, "None provided"),
        list(&req.dietary_restrictions, "None"),
        list(&req.allergies, "None"),
        protein,
    )
}

pub async fn reply(st: &AppState, req: &ChatRequest) -> Result<String, AppError> {
    let user_id = req.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::bad_request("user_id is required"));
    }
    let Some(retriever) = st.retriever.clone() else {
        info!("agents unavailable, sending fallback reply");
        return Ok(AGENTS_UNAVAILABLE.to_string());
    };

    let input = if req.is_initial_message {
        initial_preamble(req)
    } else if req.message.trim().is_empty() {
        return Err(AppError::bad_request("message is required"));
    } else {
        req.message.clone()
    };

    let answer = Dispatcher::for_user(st, retriever, user_id)
        .dispatch(&input)
        .await?;
    info!(preview = %preview(&answer), "agent reply generated");
    Ok(answer)
}
