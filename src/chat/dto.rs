use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub user_id: String,
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default, rename = "dietaryRestrictions", alias = "dietary_restrictions")]
    pub dietary_restrictions: Option<Vec<String>>,
    #[serde(default)]
    pub allergies: Option<Vec<String>>,
    #[serde(default, rename = "proteinTarget", alias = "protein_target")]
    pub protein_target: Option<u32>,
    #[serde(default)]
    pub is_initial_message: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub timestamp: String,
    pub user_avatar: &'static str,
    pub bot_avatar: &'static str,
}

impl ChatResponse {
    pub fn new(message: String, timestamp: String) -> Self {
        Self {
            message,
            timestamp,
            user_avatar: "👤",
            bot_avatar: "🤖",
        }
    }
}
