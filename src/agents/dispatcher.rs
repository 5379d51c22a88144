use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::crew::{Agent, Crew};
use super::prompts;
use super::tools::{tool_argument, PlannerTask, PlannerTool, Tool, VectorSearchTool};
use crate::error::AppError;
use crate::llm::{ChatMessage, ChatModel, CompletionRequest};
use crate::recipes::RecipeRetriever;
use crate::state::AppState;

/// Routes one chat message to a planner task and returns that task's output.
pub struct Dispatcher {
    llm: Arc<dyn ChatModel>,
    model: String,
    tools: Vec<Arc<dyn Tool>>,
}

impl Dispatcher {
    pub fn for_user(st: &AppState, retriever: Arc<dyn RecipeRetriever>, user_id: &str) -> Self {
        let model = st.config.llm.agent_model.clone();
        let crew = Crew::new(
            st.llm.clone(),
            model.clone(),
            st.memory.clone(),
            user_id,
            st.config.agents.max_iterations,
        )
        .pin_latest(PlannerTask::CreateMealPlan.name());
        let planner = Arc::new(Agent {
            role: prompts::PLANNER_ROLE,
            goal: prompts::PLANNER_GOAL,
            backstory: prompts::PLANNER_BACKSTORY,
            tools: vec![Arc::new(VectorSearchTool::new(retriever))],
        });
        let tools = PlannerTask::ALL
            .into_iter()
            .map(|kind| {
                Arc::new(PlannerTool::new(kind, crew.clone(), planner.clone())) as Arc<dyn Tool>
            })
            .collect();
        Self {
            llm: st.llm.clone(),
            model,
            tools,
        }
    }

    #[instrument(skip_all, fields(session = %Uuid::new_v4()))]
    pub async fn dispatch(&self, input: &str) -> Result<String, AppError> {
        let system = format!(
            "{}\n\nGoal: {}\n\n{}",
            prompts::MANAGER_ROLE,
            prompts::MANAGER_GOAL,
            prompts::MANAGER_BACKSTORY
        );
        let request = CompletionRequest::new(
            self.model.clone(),
            vec![
                ChatMessage::system(system),
                ChatMessage::user(prompts::routing_task(input)),
            ],
        )
        .with_tools(self.tools.iter().map(|t| t.spec()).collect());

        let completion = self.llm.complete(&request).await?;
        let Some(call) = completion.tool_calls.into_iter().next() else {
            info!("manager answered directly");
            return completion
                .content
                .filter(|c| !c.trim().is_empty())
                .ok_or_else(|| AppError::malformed("agent", "manager returned nothing"));
        };

        let tool = self
            .tools
            .iter()
            .find(|t| t.spec().name == call.name)
            .ok_or_else(|| AppError::malformed("agent", format!("unknown tool {}", call.name)))?;
        let arg = tool_argument(&call.arguments, tool.spec().parameter).unwrap_or_else(|_| {
            warn!(tool = %call.name, "unusable routing arguments, passing the message through");
            input.to_string()
        });
        info!(tool = %call.name, "message routed");
        tool.invoke(&arg).await
    }
}
