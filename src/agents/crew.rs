use std::fmt::Write as _;
use std::sync::Arc;

use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, info, instrument, warn};

use super::memory::{AgentMemory, MemoryEntry};
use super::tools::{tool_argument, Tool};
use crate::error::AppError;
use crate::llm::{ChatMessage, ChatModel, CompletionRequest};

/// Entries from earlier tasks shown to the agent.
const RECALLED_ENTRIES: usize = 3;

pub struct Agent {
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
    pub tools: Vec<Arc<dyn Tool>>,
}

impl Agent {
    fn system_prompt(&self, recalled: &[MemoryEntry]) -> String {
        let mut prompt = format!("{}\n\nGoal: {}\n\n{}", self.role, self.goal, self.backstory);
        if !recalled.is_empty() {
            prompt.push_str("\n\nPrevious work for this user, oldest first:");
            for entry in recalled {
                let _ = write!(
                    prompt,
                    "\n\n---\nTask: {}\nInput: {}\nOutput:\n{}",
                    entry.task, entry.input, entry.output
                );
            }
        }
        prompt
    }

    fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.spec().name == name)
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    pub name: &'static str,
    pub instructions: &'static str,
    pub input: String,
    pub expected_output: &'static str,
}

impl Task {
    fn prompt(&self) -> String {
        format!(
            "{}\n\nUser input:\n{}\n\nExpected output:\n{}",
            self.instructions, self.input, self.expected_output
        )
    }
}

/// Runs tasks for one user: a bounded tool-calling loop whose answers are
/// written to that user's memory.
#[derive(Clone)]
pub struct Crew {
    llm: Arc<dyn ChatModel>,
    model: String,
    memory: Arc<dyn AgentMemory>,
    scope: String,
    max_iterations: usize,
    pinned_task: Option<&'static str>,
}

impl Crew {
    pub fn new(
        llm: Arc<dyn ChatModel>,
        model: impl Into<String>,
        memory: Arc<dyn AgentMemory>,
        scope: impl Into<String>,
        max_iterations: usize,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            memory,
            scope: scope.into(),
            max_iterations: max_iterations.max(1),
            pinned_task: None,
        }
    }

    /// Always shows the newest result of `task`, even once it has left the
    /// recent-entries window.
    pub fn pin_latest(mut self, task: &'static str) -> Self {
        self.pinned_task = Some(task);
        self
    }

    async fn recall(&self) -> Result<Vec<MemoryEntry>, AppError> {
        let mut recalled = self.memory.recall(&self.scope, RECALLED_ENTRIES).await?;
        if let Some(task) = self.pinned_task {
            if let Some(pinned) = self.memory.latest(&self.scope, task).await? {
                if !recalled.contains(&pinned) {
                    recalled.insert(0, pinned);
                }
            }
        }
        Ok(recalled)
    }

    #[instrument(skip(self, agent, task), fields(task = task.name, scope = %self.scope))]
    pub async fn kickoff(&self, agent: &Agent, task: &Task) -> Result<String, AppError> {
        let recalled = self.recall().await?;
        let specs: Vec<_> = agent.tools.iter().map(|t| t.spec()).collect();
        let mut request = CompletionRequest::new(
            self.model.clone(),
            vec![
                ChatMessage::system(agent.system_prompt(&recalled)),
                ChatMessage::user(task.prompt()),
            ],
        );

        for round in 1..=self.max_iterations {
            // The last round has no tools so the model has to answer.
            request.tools = if round < self.max_iterations {
                specs.clone()
            } else {
                Vec::new()
            };
            let completion = self.llm.complete(&request).await?;

            if completion.tool_calls.is_empty() || request.tools.is_empty() {
                let answer = completion
                    .content
                    .filter(|c| !c.trim().is_empty())
                    .ok_or_else(|| AppError::malformed("agent", "empty answer"))?;
                info!(round, chars = answer.len(), "task finished");
                self.record(task, &answer).await?;
                return Ok(answer);
            }

            request.messages.push(ChatMessage::assistant_tool_calls(
                completion.content,
                completion.tool_calls.clone(),
            ));
            for call in completion.tool_calls {
                let output = match agent.tool(&call.name) {
                    Some(tool) => {
                        let arg = tool_argument(&call.arguments, tool.spec().parameter)?;
                        debug!(round, tool = %call.name, "calling tool");
                        tool.invoke(&arg).await?
                    }
                    None => {
                        warn!(round, tool = %call.name, "model asked for an unknown tool");
                        format!("Unknown tool: {}", call.name)
                    }
                };
                request.messages.push(ChatMessage::tool_result(call.id, output));
            }
        }

        Err(AppError::malformed("agent", "no answer within the iteration limit"))
    }

    async fn record(&self, task: &Task, output: &str) -> Result<(), AppError> {
        let recorded_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(anyhow::Error::from)?;
        self.memory
            .remember(
                &self.scope,
                MemoryEntry {
                    task: task.name.to_string(),
                    input: task.input.clone(),
                    output: output.to_string(),
                    recorded_at,
                },
            )
            .await
    }
}
