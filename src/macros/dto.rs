use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct SaveMacrosRequest {
    #[serde(default)]
    pub username: String,
    pub meal_name: String,
    pub food_name: String,
    pub calories: f64,
    pub proteins: f64,
    pub fats: f64,
    pub carbs: f64,
    pub date_added: Option<String>,
}

/// Row as written to the macros table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroRecord {
    pub username: String,
    pub meal_name: String,
    pub food_name: String,
    pub calories: i64,
    pub proteins: i64,
    pub fats: i64,
    pub carbs: i64,
    pub date_added: String, // YYYY-MM-DD
}

/// Row as read back, with the store-assigned id when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMacro {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub record: MacroRecord,
    /// Any other column the table returns, passed through as is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct SaveMacrosResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserMacrosResponse {
    pub success: bool,
    pub macros: Vec<StoredMacro>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DaySummary {
    pub calories: i64,
    pub proteins: i64,
    pub carbs: i64,
    pub fats: i64,
    pub meals: Vec<StoredMacro>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MacroTotals {
    pub calories: i64,
    pub proteins: i64,
    pub carbs: i64,
    pub fats: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MacroAverages {
    pub calories: f64,
    pub proteins: f64,
    pub carbs: f64,
    pub fats: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct WeeklyMacrosResponse {
    pub success: bool,
    pub daily_summary: BTreeMap<String, DaySummary>,
    pub weekly_totals: MacroTotals,
    pub daily_averages: MacroAverages,
    pub date_range: DateRange,
}
