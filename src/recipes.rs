//! Semantic recipe search: embed the query, then nearest-neighbour lookup in Qdrant.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::config::RetrievalConfig;
use crate::error::AppError;
use crate::upstream::{Retry, Upstream};

#[async_trait]
pub trait RecipeRetriever: Send + Sync {
    /// Returns the payloads of the closest recipes as one text block.
    async fn search(&self, query: &str) -> Result<String, AppError>;
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    payload: Option<Value>,
}

pub struct QdrantRetriever {
    upstream: Arc<Upstream>,
    cfg: RetrievalConfig,
}

impl QdrantRetriever {
    pub fn new(upstream: Arc<Upstream>, cfg: RetrievalConfig) -> Self {
        Self { upstream, cfg }
    }

    async fn embed(&self, query: &str) -> Result<Vec<f32>, AppError> {
        let url = format!("{}/embeddings", self.cfg.embedding_url.trim_end_matches('/'));
        let body = json!({ "model": self.cfg.embedding_model, "input": query });
        let res = self
            .upstream
            .send("embeddings", Retry::Idempotent, |c| {
                let req = c.post(&url).json(&body);
                match &self.cfg.embedding_api_key {
                    Some(key) => req.bearer_auth(key),
                    None => req,
                }
            })
            .await?;
        let parsed: EmbeddingResponse = res
            .json()
            .await
            .map_err(|e| AppError::malformed("embeddings", e.to_string()))?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| AppError::malformed("embeddings", "no embedding returned"))
    }
}

#[async_trait]
impl RecipeRetriever for QdrantRetriever {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Result<String, AppError> {
        let vector = self.embed(query).await?;
        let url = format!(
            "{}/collections/{}/points/search",
            self.cfg.qdrant_url.trim_end_matches('/'),
            self.cfg.collection
        );
        let body = json!({ "vector": vector, "limit": self.cfg.top_k, "with_payload": true });
        let res = self
            .upstream
            .send("vector store", Retry::Idempotent, |c| {
                let req = c.post(&url).json(&body);
                match &self.cfg.qdrant_api_key {
                    Some(key) => req.header("api-key", key),
                    None => req,
                }
            })
            .await?;
        let parsed: SearchResponse = res
            .json()
            .await
            .map_err(|e| AppError::malformed("vector store", e.to_string()))?;
        info!(
            hits = parsed.result.len(),
            best = parsed.result.first().map(|p| p.score),
            "recipes retrieved"
        );
        Ok(format_hits(parsed.result.into_iter().filter_map(|p| p.payload)))
    }
}

/// Joins payloads under a `Retrieved recipes:` header. No dedup, no score cut-off.
fn format_hits(payloads: impl Iterator<Item = Value>) -> String {
    let blocks: Vec<String> = payloads.map(|p| p.to_string()).collect();
    if blocks.is_empty() {
        return "Retrieved recipes: none found".to_string();
    }
    format!("Retrieved recipes:\n\n{}", blocks.join("\n\n"))
}
