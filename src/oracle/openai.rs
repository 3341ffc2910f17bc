//! OpenAI Chat Completions client with function calling
//!
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::error::OrchestrationError;
use crate::models::ToolInvocation;
use crate::oracle::{DecisionRequest, Oracle, OracleReply, SynthesisRequest};
use crate::tools::ToolDeclaration;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f32 = 0.7;

/// Reusable OpenAI client (connection-pooled)
pub struct OpenAiOracle {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiOracle {
    pub fn new(api_key: String, model: String, base_url: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(OrchestrationError::Configuration(
                "OpenAI API key is not configured. Please set OPENAI_API_KEY environment variable."
                    .to_string(),
            ));
        }

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()
            .map_err(|e| {
                OrchestrationError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    fn decision_body<'a>(&'a self, request: &'a DecisionRequest<'_>) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                WireMessage::plain("system", request.system),
                WireMessage::plain("user", request.query),
            ],
            tools: Some(request.tools.iter().map(WireTool::from).collect()),
            tool_choice: Some("auto"),
            temperature: TEMPERATURE,
        }
    }

    fn synthesis_body(&self, request: &SynthesisRequest<'_>) -> Result<ChatCompletionRequest<'_>> {
        let invocation = request.invocation;

        let replayed_call = WireMessage {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(vec![WireToolCall {
                id: invocation.call_id.clone(),
                kind: "function".to_string(),
                function: WireFunction {
                    name: invocation.name.clone(),
                    arguments: serde_json::to_string(&invocation.arguments)?,
                },
            }]),
            tool_call_id: None,
        };

        let tool_result = WireMessage {
            role: "tool".to_string(),
            content: Some(serde_json::to_string(request.result)?),
            tool_calls: None,
            tool_call_id: Some(invocation.call_id.clone()),
        };

        Ok(ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                WireMessage::plain("system", request.system),
                WireMessage::plain("user", request.query),
                replayed_call,
                tool_result,
            ],
            tools: None,
            tool_choice: None,
            temperature: TEMPERATURE,
        })
    }

    async fn complete(&self, body: &ChatCompletionRequest<'_>) -> Result<WireMessage> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %body.model, messages = body.messages.len(), "Calling OpenAI API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI API request failed: {}", e);
                OrchestrationError::Oracle(format!("OpenAI API error: {}", e))
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(OrchestrationError::Configuration(
                "OpenAI API key was rejected".to_string(),
            ));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI API error response: {}", error_text);
            return Err(OrchestrationError::Oracle(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse OpenAI response: {}", e);
            OrchestrationError::Oracle(format!("OpenAI parse error: {}", e))
        })?;

        first_message(completion)
    }
}

#[async_trait]
impl Oracle for OpenAiOracle {
    async fn decide(&self, request: &DecisionRequest<'_>) -> Result<OracleReply> {
        let message = self.complete(&self.decision_body(request)).await?;
        into_reply(message)
    }

    async fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<Option<String>> {
        let body = self.synthesis_body(request)?;
        let message = self.complete(&body).await?;
        Ok(message.content)
    }
}

fn first_message(completion: ChatCompletionResponse) -> Result<WireMessage> {
    completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| OrchestrationError::Oracle("No response from OpenAI".to_string()))
}

fn into_reply(message: WireMessage) -> Result<OracleReply> {
    let mut tool_calls = Vec::new();

    for call in message.tool_calls.unwrap_or_default() {
        if call.kind != "function" {
            warn!(kind = %call.kind, "Ignoring non-function tool call");
            continue;
        }
        // Only the first call is dispatched, so only its arguments must be valid.
        let arguments = match parse_arguments(&call.function) {
            Ok(arguments) => arguments,
            Err(e) if !tool_calls.is_empty() => {
                warn!(error = %e, "Dropping extra tool call with malformed arguments");
                continue;
            }
            Err(e) => return Err(e),
        };
        tool_calls.push(ToolInvocation {
            arguments,
            name: call.function.name,
            call_id: call.id,
        });
    }

    Ok(OracleReply {
        content: message.content,
        tool_calls,
    })
}

/// The API sends arguments as a JSON-encoded string.
fn parse_arguments(function: &WireFunction) -> Result<serde_json::Value> {
    let raw = function.arguments.trim();
    if raw.is_empty() {
        return Ok(serde_json::json!({}));
    }

    serde_json::from_str(raw).map_err(|e| {
        OrchestrationError::Validation(format!(
            "Malformed arguments for {}: {}",
            function.name, e
        ))
    })
}

//
// ================= Wire Types =================
//

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl WireMessage {
    fn plain(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolDeclaration,
}

impl<'a> From<&'a ToolDeclaration> for WireTool<'a> {
    fn from(declaration: &'a ToolDeclaration) -> Self {
        Self {
            kind: "function",
            function: declaration,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}
