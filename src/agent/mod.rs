//! Main orchestrator - the two-phase tool-calling loop
//!
//! QUERY → DECIDE → (SEARCH | CONVERT | none) → SYNTHESIZE → ANSWER

use crate::catalog::ProductIndex;
use crate::currency::CurrencyConverter;
use crate::error::OrchestrationError;
use crate::models::{
    parse_arguments, ConvertCurrenciesArgs, CurrencyConversionResult, ProductSearchResult,
    SearchProductsArgs, ToolInvocation, ToolName, ToolResult,
};
use crate::oracle::{
    DecisionRequest, Oracle, SynthesisRequest, DECISION_SYSTEM_PROMPT, SYNTHESIS_SYSTEM_PROMPT,
};
use crate::tools::ToolRegistry;
use crate::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Returned when the oracle answers directly but with no text
pub const FALLBACK_ANSWER: &str = "I apologize, but I could not generate a response.";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Orchestrator {
    oracle: Arc<dyn Oracle>,
    catalog: Arc<ProductIndex>,
    converter: Arc<CurrencyConverter>,
    registry: ToolRegistry,
    request_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        catalog: Arc<ProductIndex>,
        converter: Arc<CurrencyConverter>,
        registry: ToolRegistry,
    ) -> Self {
        Self {
            oracle,
            catalog,
            converter,
            registry,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &ProductIndex {
        &self.catalog
    }

    /// Answer one query. Every failure, including the timeout, comes back as
    /// `QueryProcessing` wrapping the cause.
    pub async fn process_query(&self, query: &str) -> Result<String> {
        let start = Instant::now();

        let outcome = match tokio::time::timeout(self.request_timeout, self.answer(query)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(OrchestrationError::Timeout(self.request_timeout)),
        };

        match outcome {
            Ok(answer) => {
                info!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Query processed successfully"
                );
                Ok(answer)
            }
            Err(e) => {
                error!(error = %e, "Error processing query");
                Err(e.into_query_error())
            }
        }
    }

    /// One pass of the loop, without timeout or error wrapping.
    pub async fn answer(&self, query: &str) -> Result<String> {
        if query.trim().is_empty() {
            return Err(OrchestrationError::Validation(
                "Query must not be empty".to_string(),
            ));
        }

        // Phase 1: decide
        let decision = DecisionRequest {
            system: DECISION_SYSTEM_PROMPT,
            tools: self.registry.declarations(),
            query,
        };
        let reply = self.oracle.decide(&decision).await?;

        if reply.tool_calls.len() > 1 {
            warn!(
                count = reply.tool_calls.len(),
                "Oracle requested several tools, only the first is dispatched"
            );
        }

        let Some(invocation) = reply.tool_calls.into_iter().next() else {
            info!("Direct response (no tool call needed)");
            return Ok(reply
                .content
                .filter(|content| !content.is_empty())
                .unwrap_or_else(|| FALLBACK_ANSWER.to_string()));
        };

        // Dispatch
        let result = self.dispatch(&invocation, query).await?;
        info!(tool = %result.tool(), "Tool finished, synthesizing answer");

        // Phase 2: synthesize
        let synthesis = SynthesisRequest {
            system: SYNTHESIS_SYSTEM_PROMPT,
            query,
            invocation: &invocation,
            result: &result,
        };

        self.oracle
            .synthesize(&synthesis)
            .await?
            .filter(|content| !content.is_empty())
            .ok_or(OrchestrationError::EmptyOracleResponse)
    }

    async fn dispatch(&self, invocation: &ToolInvocation, query: &str) -> Result<ToolResult> {
        let tool: ToolName = invocation.name.parse()?;
        if self.registry.get(tool).is_none() {
            return Err(OrchestrationError::UnknownTool(invocation.name.clone()));
        }

        info!(tool = %tool, call_id = %invocation.call_id, "Executing tool");

        match tool {
            ToolName::SearchProducts => {
                let args: SearchProductsArgs = parse_arguments(invocation)?;
                let search_query = args
                    .query
                    .filter(|q| !q.trim().is_empty())
                    .unwrap_or_else(|| query.to_string());

                let products = self.catalog.search(&search_query);
                info!(count = products.len(), query = %search_query, "Found products");

                Ok(ToolResult::ProductSearch(ProductSearchResult::from_entries(
                    &products,
                )))
            }
            ToolName::ConvertCurrencies => {
                let args: ConvertCurrenciesArgs = parse_arguments(invocation)?;
                let converted = self
                    .converter
                    .convert(args.amount, &args.from_currency, &args.to_currency)
                    .await?;

                Ok(ToolResult::CurrencyConversion(CurrencyConversionResult {
                    original_amount: args.amount,
                    from_currency: args.from_currency,
                    to_currency: args.to_currency,
                    converted_amount: converted,
                }))
            }
        }
    }
}
