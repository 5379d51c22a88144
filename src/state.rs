use std::sync::Arc;

use tracing::{info, warn};

use crate::agents::{AgentMemory, FileMemory};
use crate::backend::RestBackend;
use crate::config::AppConfig;
use crate::llm::{ChatModel, OpenAiCompatible};
use crate::macros::MacroStore;
use crate::meal_plans::MealPlanStore;
use crate::recipes::{QdrantRetriever, RecipeRetriever};
use crate::upstream::Upstream;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub llm: Arc<dyn ChatModel>,
    /// `None` disables chat.
    pub retriever: Option<Arc<dyn RecipeRetriever>>,
    pub memory: Arc<dyn AgentMemory>,
    pub macros: Arc<dyn MacroStore>,
    pub meal_plans: Arc<dyn MealPlanStore>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let upstream = Arc::new(Upstream::new(&config.upstream)?);

        let llm = Arc::new(OpenAiCompatible::new(upstream.clone(), &config.llm)) as Arc<dyn ChatModel>;
        let backend = Arc::new(RestBackend::new(upstream.clone(), config.backend.clone()));

        let retriever = config.retrieval.clone().map(|cfg| {
            info!(collection = %cfg.collection, "recipe retrieval enabled");
            Arc::new(QdrantRetriever::new(upstream.clone(), cfg)) as Arc<dyn RecipeRetriever>
        });
        if retriever.is_none() {
            warn!("QDRANT_URL or EMBEDDING_URL not set; chat agents are unavailable");
        }

        let memory = Arc::new(FileMemory::new(config.agents.memory_path.clone())) as Arc<dyn AgentMemory>;

        Ok(Self {
            config,
            llm,
            retriever,
            memory,
            macros: backend.clone(),
            meal_plans: backend,
        })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with_llm(Arc::new(crate::test_support::ScriptedModel::new(Vec::new())))
    }

    /// In-memory stores and retriever around the given model.
    #[cfg(test)]
    pub fn fake_with_llm(llm: Arc<dyn ChatModel>) -> Self {
        use crate::test_support::{
            test_config, FakeRetriever, InMemoryAgentMemory, InMemoryMacros, InMemoryMealPlans,
        };

        Self {
            config: Arc::new(test_config()),
            llm,
            retriever: Some(Arc::new(FakeRetriever)),
            memory: Arc::new(InMemoryAgentMemory::default()),
            macros: Arc::new(InMemoryMacros::default()),
            meal_plans: Arc::new(InMemoryMealPlans::default()),
        }
    }
}
