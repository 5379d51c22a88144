//! In-memory stand-ins for the external services, used by `AppState::fake`.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use time::Date;

use crate::agents::memory::{AgentMemory, MemoryEntry};
use crate::config::AppConfig;
use crate::dates::format_date;
use crate::error::AppError;
use crate::llm::{ChatModel, Completion, CompletionRequest};
use crate::macros::dto::{MacroRecord, StoredMacro};
use crate::macros::MacroStore;
use crate::meal_plans::dto::{PlanRef, SavedMealPlan};
use crate::meal_plans::MealPlanStore;
use crate::recipes::RecipeRetriever;

pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| {
        let value = match key {
            "SAMBANOVA_API_KEY" => "sk-test",
            "SUPABASE_URL" => "http://backend.invalid",
            "SUPABASE_ANON_KEY" => "anon",
            "QDRANT_URL" => "http://qdrant.invalid",
            "EMBEDDING_URL" => "http://embeddings.invalid",
            "AGENT_MAX_ITERATIONS" => "4",
            _ => return None,
        };
        Some(value.to_string())
    })
    .expect("test config is complete")
}

/// Replies with queued completions in order and records every request.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Completion>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Completion>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::malformed("llm", "no scripted reply left"))
    }
}

pub struct FakeRetriever;

#[async_trait]
impl RecipeRetriever for FakeRetriever {
    async fn search(&self, query: &str) -> Result<String, AppError> {
        Ok(format!("Retrieved recipes:\n\n{{\"title\":\"{query} bowl\"}}"))
    }
}

#[derive(Default)]
pub struct InMemoryAgentMemory {
    scopes: Mutex<BTreeMap<String, Vec<MemoryEntry>>>,
}

#[async_trait]
impl AgentMemory for InMemoryAgentMemory {
    async fn recall(&self, scope: &str, limit: usize) -> Result<Vec<MemoryEntry>, AppError> {
        let scopes = self.scopes.lock().unwrap();
        let entries = scopes.get(scope).cloned().unwrap_or_default();
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.into_iter().skip(skip).collect())
    }

    async fn latest(&self, scope: &str, task: &str) -> Result<Option<MemoryEntry>, AppError> {
        let scopes = self.scopes.lock().unwrap();
        Ok(scopes
            .get(scope)
            .and_then(|entries| entries.iter().rev().find(|e| e.task == task).cloned()))
    }

    async fn remember(&self, scope: &str, entry: MemoryEntry) -> Result<(), AppError> {
        self.scopes
            .lock()
            .unwrap()
            .entry(scope.to_string())
            .or_default()
            .push(entry);
        Ok(())
    }
}

/// Append-only table; ids are assigned in insertion order.
#[derive(Default)]
pub struct InMemoryMacros {
    rows: Mutex<Vec<StoredMacro>>,
}

impl InMemoryMacros {
    fn select(&self, keep: impl Fn(&MacroRecord) -> bool) -> Vec<StoredMacro> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| keep(&row.record))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl MacroStore for InMemoryMacros {
    async fn insert(&self, record: &MacroRecord) -> Result<(), AppError> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(StoredMacro {
            id: Some(id),
            record: record.clone(),
            extra: serde_json::Map::from_iter([(
                "created_at".to_string(),
                serde_json::Value::String("2024-03-09T10:00:00+00:00".into()),
            )]),
        });
        Ok(())
    }

    async fn for_user(&self, username: &str, date: Option<&str>) -> Result<Vec<StoredMacro>, AppError> {
        let mut rows = self.select(|r| r.username == username && date.map_or(true, |d| r.date_added == d));
        rows.sort_by(|a, b| {
            b.record
                .date_added
                .cmp(&a.record.date_added)
                .then_with(|| a.record.meal_name.cmp(&b.record.meal_name))
        });
        Ok(rows)
    }

    async fn for_range(&self, username: &str, start: Date, end: Date) -> Result<Vec<StoredMacro>, AppError> {
        let (start, end) = (format_date(start), format_date(end));
        let mut rows = self.select(|r| {
            r.username == username && r.date_added >= start && r.date_added <= end
        });
        rows.sort_by(|a, b| {
            a.record
                .date_added
                .cmp(&b.record.date_added)
                .then_with(|| a.record.meal_name.cmp(&b.record.meal_name))
        });
        Ok(rows)
    }
}

/// Enforces a unique `(username, mp_name)` pair like the real table.
#[derive(Default)]
pub struct InMemoryMealPlans {
    rows: Mutex<Vec<SavedMealPlan>>,
}

fn name_taken() -> AppError {
    AppError::Upstream {
        service: "backend",
        status: 409,
        message: r#"{"code":"23505","message":"duplicate key value"}"#.into(),
    }
}

#[async_trait]
impl MealPlanStore for InMemoryMealPlans {
    async fn insert(&self, plan: &SavedMealPlan) -> Result<Option<SavedMealPlan>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|r| r.username == plan.username && r.mp_name == plan.mp_name)
        {
            return Err(name_taken());
        }
        let stored = SavedMealPlan {
            id: Some(rows.len() as i64 + 1),
            ..plan.clone()
        };
        rows.push(stored.clone());
        Ok(Some(stored))
    }

    async fn for_user(&self, username: &str) -> Result<Vec<SavedMealPlan>, AppError> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.username == username)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn rename(
        &self,
        username: &str,
        plan: &PlanRef,
        new_name: &str,
    ) -> Result<Option<SavedMealPlan>, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let Some(idx) = rows
            .iter()
            .position(|r| r.username == username && plan.matches(r))
        else {
            return Ok(None);
        };
        if rows
            .iter()
            .enumerate()
            .any(|(i, r)| i != idx && r.username == username && r.mp_name == new_name)
        {
            return Err(name_taken());
        }
        rows[idx].mp_name = new_name.to_string();
        Ok(Some(rows[idx].clone()))
    }

    async fn delete(&self, username: &str, plan: &PlanRef) -> Result<usize, AppError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| !(r.username == username && plan.matches(r)));
        Ok(before - rows.len())
    }

    async fn count(&self, username: &str) -> Result<u64, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|r| r.username == username).count() as u64)
    }
}
