use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::crew::{Agent, Crew, Task};
use super::prompts;
use crate::error::AppError;
use crate::llm::ToolSpec;
use crate::recipes::RecipeRetriever;

/// Something a model can call with a single string argument.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;

    async fn invoke(&self, input: &str) -> Result<String, AppError>;
}

/// Extracts the tool's string argument from the model's raw JSON arguments.
pub fn tool_argument(raw: &str, parameter: &str) -> Result<String, AppError> {
    let malformed = || AppError::malformed("agent", format!("unusable tool arguments: {raw}"));
    match serde_json::from_str::<Value>(raw).map_err(|_| malformed())? {
        Value::String(s) => Ok(s),
        Value::Object(map) => {
            if let Some(Value::String(s)) = map.get(parameter) {
                return Ok(s.clone());
            }
            // Models sometimes rename the only parameter.
            let mut strings = map.values().filter_map(Value::as_str);
            match (strings.next(), strings.next()) {
                (Some(s), None) => Ok(s.to_string()),
                _ => Err(malformed()),
            }
        }
        _ => Err(malformed()),
    }
}

pub struct VectorSearchTool {
    retriever: Arc<dyn RecipeRetriever>,
}

impl VectorSearchTool {
    pub fn new(retriever: Arc<dyn RecipeRetriever>) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl Tool for VectorSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "vector_search",
            description: prompts::VECTOR_SEARCH_DESCRIPTION,
            parameter: "query",
        }
    }

    async fn invoke(&self, input: &str) -> Result<String, AppError> {
        self.retriever.search(input).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerTask {
    CreateMealPlan,
    AnswerFollowup,
    SaveMealPlan,
}

impl PlannerTask {
    pub const ALL: [PlannerTask; 3] = [
        PlannerTask::CreateMealPlan,
        PlannerTask::AnswerFollowup,
        PlannerTask::SaveMealPlan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PlannerTask::CreateMealPlan => "create_meal_plan",
            PlannerTask::AnswerFollowup => "answer_followup_question",
            PlannerTask::SaveMealPlan => "save_meal_plan",
        }
    }

    fn description(self) -> &'static str {
        match self {
            PlannerTask::CreateMealPlan => prompts::CREATE_PLAN_DESCRIPTION,
            PlannerTask::AnswerFollowup => prompts::FOLLOWUP_DESCRIPTION,
            PlannerTask::SaveMealPlan => prompts::SAVE_PLAN_DESCRIPTION,
        }
    }

    pub fn task(self, input: &str) -> Task {
        let (instructions, expected_output) = match self {
            PlannerTask::CreateMealPlan => {
                (prompts::CREATE_PLAN_INSTRUCTIONS, prompts::WEEKLY_PLAN_TEMPLATE)
            }
            PlannerTask::AnswerFollowup => {
                (prompts::FOLLOWUP_INSTRUCTIONS, prompts::FOLLOWUP_EXPECTED_OUTPUT)
            }
            PlannerTask::SaveMealPlan => {
                (prompts::RECALL_PLAN_INSTRUCTIONS, prompts::WEEKLY_PLAN_TEMPLATE)
            }
        };
        Task {
            name: self.name(),
            instructions,
            input: input.to_string(),
            expected_output,
        }
    }
}

/// Runs one planner task through the crew when the manager picks it.
pub struct PlannerTool {
    kind: PlannerTask,
    crew: Crew,
    planner: Arc<Agent>,
}

impl PlannerTool {
    pub fn new(kind: PlannerTask, crew: Crew, planner: Arc<Agent>) -> Self {
        Self { kind, crew, planner }
    }
}

#[async_trait]
impl Tool for PlannerTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.kind.name(),
            description: self.kind.description(),
            parameter: "input",
        }
    }

    async fn invoke(&self, input: &str) -> Result<String, AppError> {
        self.crew.kickoff(&self.planner, &self.kind.task(input)).await
    }
}
