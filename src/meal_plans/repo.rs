use async_trait::async_trait;
use serde_json::json;

use super::dto::{PlanRef, SavedMealPlan};
use crate::backend::RestBackend;
use crate::error::AppError;

#[async_trait]
pub trait MealPlanStore: Send + Sync {
    /// Inserts the plan and returns the stored row when the store echoes one.
    async fn insert(&self, plan: &SavedMealPlan) -> Result<Option<SavedMealPlan>, AppError>;

    /// All plans of a user, newest first.
    async fn for_user(&self, username: &str) -> Result<Vec<SavedMealPlan>, AppError>;

    /// Renames the user's plan; `None` when no plan of theirs matched.
    async fn rename(
        &self,
        username: &str,
        plan: &PlanRef,
        new_name: &str,
    ) -> Result<Option<SavedMealPlan>, AppError>;

    /// Deletes the user's matching plans and returns how many went.
    async fn delete(&self, username: &str, plan: &PlanRef) -> Result<usize, AppError>;

    async fn count(&self, username: &str) -> Result<u64, AppError>;
}

fn owned_by(username: &str, plan: &PlanRef) -> [(&'static str, String); 2] {
    [plan.filter(), ("username", format!("eq.{username}"))]
}

#[async_trait]
impl MealPlanStore for RestBackend {
    async fn insert(&self, plan: &SavedMealPlan) -> Result<Option<SavedMealPlan>, AppError> {
        let rows: Vec<SavedMealPlan> = self
            .insert_row(&self.cfg.meal_plans_table, plan, true)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn for_user(&self, username: &str) -> Result<Vec<SavedMealPlan>, AppError> {
        let filters = [
            ("username", format!("eq.{username}")),
            ("order", "created_at.desc".to_string()),
        ];
        self.select_rows(&self.cfg.meal_plans_table, &filters).await
    }

    async fn rename(
        &self,
        username: &str,
        plan: &PlanRef,
        new_name: &str,
    ) -> Result<Option<SavedMealPlan>, AppError> {
        let rows: Vec<SavedMealPlan> = self
            .update_rows(
                &self.cfg.meal_plans_table,
                &owned_by(username, plan),
                &json!({ "mp_name": new_name }),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete(&self, username: &str, plan: &PlanRef) -> Result<usize, AppError> {
        self.delete_rows(&self.cfg.meal_plans_table, &owned_by(username, plan))
            .await
    }

    async fn count(&self, username: &str) -> Result<u64, AppError> {
        self.count_rows(
            &self.cfg.meal_plans_table,
            &[("username", format!("eq.{username}"))],
        )
        .await
    }
}
