use async_trait::async_trait;
use time::Date;

use super::dto::{MacroRecord, StoredMacro};
use crate::backend::RestBackend;
use crate::dates::format_date;
use crate::error::AppError;

#[async_trait]
pub trait MacroStore: Send + Sync {
    async fn insert(&self, record: &MacroRecord) -> Result<(), AppError>;

    /// Entries for one user, newest day first; exact day filter when `date` is set.
    async fn for_user(&self, username: &str, date: Option<&str>) -> Result<Vec<StoredMacro>, AppError>;

    /// Entries for one user within `[start, end]`, oldest day first.
    async fn for_range(&self, username: &str, start: Date, end: Date) -> Result<Vec<StoredMacro>, AppError>;
}

#[async_trait]
impl MacroStore for RestBackend {
    async fn insert(&self, record: &MacroRecord) -> Result<(), AppError> {
        self.insert_row::<_, serde_json::Value>(&self.cfg.macros_table, record, false)
            .await?;
        Ok(())
    }

    async fn for_user(&self, username: &str, date: Option<&str>) -> Result<Vec<StoredMacro>, AppError> {
        let mut filters = vec![
            ("username", format!("eq.{username}")),
            ("order", "date_added.desc,meal_name.asc".to_string()),
        ];
        if let Some(date) = date {
            filters.push(("date_added", format!("eq.{date}")));
        }
        self.select_rows(&self.cfg.macros_table, &filters).await
    }

    async fn for_range(&self, username: &str, start: Date, end: Date) -> Result<Vec<StoredMacro>, AppError> {
        let filters = [
            ("username", format!("eq.{username}")),
            ("date_added", format!("gte.{}", format_date(start))),
            ("date_added", format!("lte.{}", format_date(end))),
            ("order", "date_added.asc,meal_name.asc".to_string()),
        ];
        self.select_rows(&self.cfg.macros_table, &filters).await
    }
}
