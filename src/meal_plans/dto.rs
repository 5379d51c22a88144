use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMealPlanRequest {
    #[serde(default, alias = "user_id")]
    pub user_id: String,
    #[serde(default, alias = "meal_plan_content")]
    pub meal_plan_content: String,
    #[serde(default, alias = "plan_name")]
    pub plan_name: Option<String>,
}

/// Row in the saved meal plans table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMealPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub username: String,
    pub mp_name: String,
    pub mp: String,
    /// Legacy rows may hold null or junk here; reads replace it with the read time.
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveMealPlanResponse {
    pub success: bool,
    pub meal_plan: SavedMealPlan,
}

#[derive(Debug, Serialize)]
pub struct MealPlanListResponse {
    pub success: bool,
    pub meal_plans: Vec<SavedMealPlan>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameMealPlanRequest {
    #[serde(default, alias = "new_name")]
    pub new_name: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteMealPlanResponse {
    pub success: bool,
    pub deleted: usize,
}

#[derive(Debug, Serialize)]
pub struct MealPlanCountResponse {
    pub success: bool,
    pub count: u64,
}

/// A plan as clients address it: the numeric row id, or the `<index>-<name>`
/// form for rows listed without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanRef {
    Id(i64),
    Name(String),
}

impl PlanRef {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AppError::bad_request("Plan ID is required"));
        }
        if raw.bytes().all(|b| b.is_ascii_digit()) {
            return raw
                .parse()
                .map(Self::Id)
                .map_err(|_| AppError::bad_request("Invalid plan ID format"));
        }
        match raw.split_once('-') {
            Some((_, name)) if !name.is_empty() => Ok(Self::Name(name.to_string())),
            _ => Err(AppError::bad_request("Invalid plan ID format")),
        }
    }

    /// PostgREST filter selecting this plan.
    pub fn filter(&self) -> (&'static str, String) {
        match self {
            Self::Id(id) => ("id", format!("eq.{id}")),
            Self::Name(name) => ("mp_name", format!("eq.{name}")),
        }
    }

    pub fn matches(&self, plan: &SavedMealPlan) -> bool {
        match self {
            Self::Id(id) => plan.id == Some(*id),
            Self::Name(name) => &plan.mp_name == name,
        }
    }
}
