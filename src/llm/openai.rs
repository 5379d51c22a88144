use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::{ChatMessage, ChatModel, Completion, CompletionRequest, MessageContent, ToolCall, ToolSpec};
use crate::config::LlmConfig;
use crate::error::AppError;
use crate::upstream::{Retry, Upstream};

const SERVICE: &str = "llm";

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WireToolCall<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionCall<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunctionCall<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction<'a>,
}

#[derive(Debug, Serialize)]
struct WireFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireResponseToolCall {
    #[serde(default)]
    id: Option<String>,
    function: WireResponseFunction,
}

#[derive(Debug, Deserialize)]
struct WireResponseFunction {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

fn wire_message(msg: &ChatMessage) -> WireMessage<'_> {
    let content = match &msg.content {
        Some(MessageContent::Text(text)) => Value::String(text.clone()),
        Some(MessageContent::Parts(parts)) => json!(parts),
        None => Value::Null,
    };
    WireMessage {
        role: msg.role.as_str(),
        content,
        tool_calls: msg
            .tool_calls
            .iter()
            .map(|c| WireToolCall {
                id: &c.id,
                kind: "function",
                function: WireFunctionCall {
                    name: &c.name,
                    arguments: &c.arguments,
                },
            })
            .collect(),
        tool_call_id: msg.tool_call_id.as_deref(),
    }
}

fn wire_tool(spec: &ToolSpec) -> WireTool<'_> {
    WireTool {
        kind: "function",
        function: WireFunction {
            name: spec.name,
            description: spec.description,
            parameters: json!({
                "type": "object",
                "properties": { spec.parameter: { "type": "string" } },
                "required": [spec.parameter],
            }),
        },
    }
}

fn wire_request(req: &CompletionRequest) -> WireRequest<'_> {
    WireRequest {
        model: &req.model,
        messages: req.messages.iter().map(wire_message).collect(),
        tools: req.tools.iter().map(wire_tool).collect(),
        tool_choice: (!req.tools.is_empty()).then_some("auto"),
    }
}

fn into_completion(res: WireResponse) -> Result<Completion, AppError> {
    let choice = res
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AppError::malformed(SERVICE, "response has no choices"))?;
    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, c)| ToolCall {
            id: c.id.unwrap_or_else(|| format!("call_{i}")),
            name: c.function.name,
            // Some providers send arguments as an object instead of a JSON string.
            arguments: match c.function.arguments {
                Some(Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => String::from("{}"),
            },
        })
        .collect();
    Ok(Completion {
        content: choice.message.content,
        tool_calls,
    })
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompatible {
    upstream: Arc<Upstream>,
    endpoint: String,
    api_key: String,
}

impl OpenAiCompatible {
    pub fn new(upstream: Arc<Upstream>, cfg: &LlmConfig) -> Self {
        Self {
            upstream,
            endpoint: format!("{}/chat/completions", cfg.base_url.trim_end_matches('/')),
            api_key: cfg.api_key.clone(),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatible {
    #[instrument(skip_all, fields(model = %request.model, messages = request.messages.len(), tools = request.tools.len()))]
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, AppError> {
        let body = wire_request(request);
        let res = self
            .upstream
            .send(SERVICE, Retry::Idempotent, |c| {
                c.post(&self.endpoint).bearer_auth(&self.api_key).json(&body)
            })
            .await?;
        let parsed: WireResponse = res
            .json()
            .await
            .map_err(|e| AppError::malformed(SERVICE, e.to_string()))?;
        let completion = into_completion(parsed)?;
        debug!(
            tool_calls = completion.tool_calls.len(),
            chars = completion.content.as_deref().map(str::len).unwrap_or(0),
            "completion received"
        );
        Ok(completion)
    }
}
