//! Oracle trait and request types
//!
//! The oracle is the external function-calling model. It is stateless per call:
//! the decision call sees the tools and the query, the synthesis call sees the
//! query plus the replayed tool call and its result.

use crate::models::{ToolInvocation, ToolResult};
use crate::tools::ToolDeclaration;
use crate::Result;
use async_trait::async_trait;

pub mod openai;
pub use openai::OpenAiOracle;

pub const DECISION_SYSTEM_PROMPT: &str = "You are a helpful customer support and sales assistant for an online store. \
You can help customers find products and convert prices between currencies. \
When a customer asks about products, use the searchProducts function. \
When a customer asks about currency conversion, use the convertCurrencies function. \
Always be friendly, helpful, and provide clear information.";

pub const SYNTHESIS_SYSTEM_PROMPT: &str = "You are a helpful customer support and sales assistant for an online store. \
You can help customers find products and convert prices between currencies. \
Always be friendly, helpful, and provide clear information.";

/// Phase 1: let the oracle answer directly or pick a tool.
#[derive(Debug, Clone)]
pub struct DecisionRequest<'a> {
    pub system: &'a str,
    pub tools: &'a [ToolDeclaration],
    pub query: &'a str,
}

/// Phase 2: turn a tool result into the final answer.
#[derive(Debug, Clone)]
pub struct SynthesisRequest<'a> {
    pub system: &'a str,
    pub query: &'a str,
    pub invocation: &'a ToolInvocation,
    pub result: &'a ToolResult,
}

/// What the oracle returned from a decision call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolInvocation>,
}

impl OracleReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_call(invocation: ToolInvocation) -> Self {
        Self {
            content: None,
            tool_calls: vec![invocation],
        }
    }
}

#[async_trait]
pub trait Oracle: Send + Sync {
    async fn decide(&self, request: &DecisionRequest<'_>) -> Result<OracleReply>;

    /// `None` when the oracle produced no content.
    async fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<Option<String>>;
}
