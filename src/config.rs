use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub agent_model: String,
    pub vision_model: String,
}

/// Hosted relational backend reached over PostgREST.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: String,
    pub api_key: String,
    pub macros_table: String,
    pub meal_plans_table: String,
}

#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub collection: String,
    pub embedding_url: String,
    pub embedding_model: String,
    pub embedding_api_key: Option<String>,
    pub top_k: usize,
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub memory_path: PathBuf,
    pub max_iterations: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub backend: BackendConfig,
    /// `None` when the vector store or the embedding endpoint is not configured;
    /// chat is reported unavailable in that case.
    pub retrieval: Option<RetrievalConfig>,
    pub upstream: UpstreamConfig,
    pub agents: AgentConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| get(key).with_context(|| format!("{key} must be set"));
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let llm = LlmConfig {
            base_url: or("LLM_BASE_URL", "https://api.sambanova.ai/v1"),
            api_key: require("SAMBANOVA_API_KEY")?,
            agent_model: or("AGENT_MODEL", "Meta-Llama-3.3-70B-Instruct"),
            vision_model: or("VISION_MODEL", "Llama-3.2-11B-Vision-Instruct"),
        };

        let backend = BackendConfig {
            url: require("SUPABASE_URL")?,
            api_key: require("SUPABASE_ANON_KEY")?,
            macros_table: or("MACROS_TABLE", "saved_macros"),
            meal_plans_table: or("MEAL_PLANS_TABLE", "saved_mps"),
        };

        let retrieval = match (get("QDRANT_URL"), get("EMBEDDING_URL")) {
            (Some(qdrant_url), Some(embedding_url)) => Some(RetrievalConfig {
                qdrant_url,
                qdrant_api_key: get("QDRANT_API_KEY"),
                collection: or("RECIPE_COLLECTION", "recipe_data"),
                embedding_url,
                embedding_model: or("EMBEDDING_MODEL", "all-MiniLM-L6-v2"),
                embedding_api_key: get("EMBEDDING_API_KEY"),
                top_k: parse_or(get("RECIPE_TOP_K"), 5),
            }),
            _ => None,
        };

        let upstream = UpstreamConfig {
            timeout_secs: parse_or(get("UPSTREAM_TIMEOUT_SECS"), 120),
            connect_timeout_secs: parse_or(get("UPSTREAM_CONNECT_TIMEOUT_SECS"), 10),
            max_retries: parse_or(get("UPSTREAM_MAX_RETRIES"), 2),
            backoff_ms: parse_or(get("UPSTREAM_BACKOFF_MS"), 250),
        };

        let agents = AgentConfig {
            memory_path: PathBuf::from(or("AGENT_MEMORY_PATH", "long_term/agent_memory.json")),
            max_iterations: parse_or(get("AGENT_MAX_ITERATIONS"), 6).max(1),
        };

        Ok(Self {
            llm,
            backend,
            retrieval,
            upstream,
            agents,
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("SAMBANOVA_API_KEY", "sk-test"),
        ("SUPABASE_URL", "https://backend.local"),
        ("SUPABASE_ANON_KEY", "anon"),
    ];

    #[test]
    fn defaults_apply_when_optional_vars_missing() {
        let cfg = AppConfig::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(cfg.llm.base_url, "https://api.sambanova.ai/v1");
        assert_eq!(cfg.llm.vision_model, "Llama-3.2-11B-Vision-Instruct");
        assert_eq!(cfg.backend.macros_table, "saved_macros");
        assert_eq!(cfg.upstream.max_retries, 2);
        assert_eq!(cfg.agents.max_iterations, 6);
        assert!(cfg.retrieval.is_none());
    }

    #[test]
    fn backend_credentials_are_mandatory() {
        let err = AppConfig::from_lookup(lookup(&[
            ("SAMBANOVA_API_KEY", "sk-test"),
            ("SUPABASE_URL", "https://backend.local"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SUPABASE_ANON_KEY"));
    }

    #[test]
    fn retrieval_needs_both_vector_store_and_embedder() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("QDRANT_URL", "http://qdrant:6333"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).unwrap().retrieval.is_none());

        pairs.push(("EMBEDDING_URL", "http://embed/v1"));
        pairs.push(("RECIPE_TOP_K", "not-a-number"));
        let retrieval = AppConfig::from_lookup(lookup(&pairs))
            .unwrap()
            .retrieval
            .unwrap();
        assert_eq!(retrieval.collection, "recipe_data");
        assert_eq!(retrieval.top_k, 5);
    }
}
