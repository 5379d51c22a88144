use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{info, warn};

use super::dto::{PlanRef, SaveMealPlanRequest, SavedMealPlan};
use crate::dates::format_date;
use crate::error::AppError;
use crate::state::AppState;

fn is_unique_violation(err: &AppError) -> bool {
    matches!(err, AppError::Upstream { status, message, .. } if *status == 409 || message.contains("23505"))
}

fn plan_name(requested: Option<&str>, now: OffsetDateTime) -> String {
    match requested.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => format!("Meal Plan ({})", format_date(now.date())),
    }
}

/// Stores a plan; a name clash is retried once with a millisecond suffix.
pub async fn save_meal_plan(st: &AppState, req: SaveMealPlanRequest) -> Result<SavedMealPlan, AppError> {
    let username = req.user_id.trim().to_string();
    if username.is_empty() {
        return Err(AppError::bad_request("User ID is required"));
    }
    if req.meal_plan_content.trim().is_empty() {
        return Err(AppError::bad_request("Meal plan content is required"));
    }

    let now = OffsetDateTime::now_utc();
    let mut plan = SavedMealPlan {
        id: None,
        username,
        mp_name: plan_name(req.plan_name.as_deref(), now),
        mp: req.meal_plan_content,
        created_at: Some(now.format(&Rfc3339).map_err(anyhow::Error::from)?),
    };

    let stored = match st.meal_plans.insert(&plan).await {
        Err(e) if is_unique_violation(&e) => {
            warn!(name = %plan.mp_name, "plan name taken; retrying with a unique name");
            plan.mp_name = format!("{} ({})", plan.mp_name, now.unix_timestamp_nanos() / 1_000_000);
            st.meal_plans.insert(&plan).await?
        }
        other => other?,
    };

    info!(username = %plan.username, name = %plan.mp_name, "meal plan saved");
    Ok(stored.unwrap_or(plan))
}

fn required_username(raw: &str) -> Result<&str, AppError> {
    match raw.trim() {
        "" => Err(AppError::bad_request("User ID is required")),
        name => Ok(name),
    }
}

/// Missing or unparseable timestamps become `now`, so one bad row cannot sink the list.
fn normalize_created_at(plan: &mut SavedMealPlan, now: &str) {
    let valid = plan
        .created_at
        .as_deref()
        .is_some_and(|ts| OffsetDateTime::parse(ts, &Rfc3339).is_ok());
    if !valid {
        plan.created_at = Some(now.to_string());
    }
}

pub async fn list_meal_plans(st: &AppState, username: &str) -> Result<Vec<SavedMealPlan>, AppError> {
    let username = required_username(username)?;
    let mut plans = st.meal_plans.for_user(username).await?;
    let now = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(anyhow::Error::from)?;
    for plan in &mut plans {
        normalize_created_at(plan, &now);
    }
    info!(plans = plans.len(), "saved meal plans fetched");
    Ok(plans)
}

pub async fn rename_meal_plan(
    st: &AppState,
    username: &str,
    plan_id: &str,
    new_name: &str,
) -> Result<SavedMealPlan, AppError> {
    let username = required_username(username)?;
    let plan = PlanRef::parse(plan_id)?;
    let new_name = new_name.trim();
    if new_name.is_empty() {
        return Err(AppError::bad_request("New name is required"));
    }

    let renamed = match st.meal_plans.rename(username, &plan, new_name).await {
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::bad_request(format!(
                "A meal plan named \"{new_name}\" already exists"
            )))
        }
        other => other?,
    };
    let mut renamed = renamed.ok_or_else(|| AppError::NotFound("Meal plan not found".into()))?;
    let now = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(anyhow::Error::from)?;
    normalize_created_at(&mut renamed, &now);
    info!(username, ?plan, name = %renamed.mp_name, "meal plan renamed");
    Ok(renamed)
}

pub async fn delete_meal_plan(st: &AppState, username: &str, plan_id: &str) -> Result<usize, AppError> {
    let username = required_username(username)?;
    let plan = PlanRef::parse(plan_id)?;
    let deleted = st.meal_plans.delete(username, &plan).await?;
    info!(username, ?plan, deleted, "meal plan deleted");
    Ok(deleted)
}

pub async fn count_meal_plans(st: &AppState, username: &str) -> Result<u64, AppError> {
    st.meal_plans.count(required_username(username)?).await
}
