use serde::{Deserialize, Serialize};

use super::parsing::MacroEstimate;

#[derive(Debug, Serialize)]
pub struct IngredientResponse {
    pub success: bool,
    pub ingredients: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MacroAnalysisResponse {
    pub success: bool,
    pub macros: MacroEstimate,
    /// Set when the model output could not be parsed and the macros are zeroed.
    pub degraded: bool,
}

#[derive(Debug, Deserialize)]
pub struct FoodNameQuery {
    pub food_name: Option<String>,
}
