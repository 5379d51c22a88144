//! Meal-planning agents: a manager that routes each chat message to one
//! planner task, and the crew loop that runs that task with recipe search.

mod crew;
mod dispatcher;
pub mod memory;
mod prompts;
mod tools;

pub use dispatcher::Dispatcher;
pub use memory::{AgentMemory, FileMemory};
