//! Test doubles shared by the unit tests

use crate::catalog::ProductIndex;
use crate::error::OrchestrationError;
use crate::models::{CatalogEntry, ExchangeRateSnapshot, ToolInvocation};
use crate::oracle::{DecisionRequest, Oracle, OracleReply, SynthesisRequest};
use crate::currency::RateProvider;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) fn entry(title: &str, search_text: &str, category: &str) -> CatalogEntry {
    CatalogEntry {
        title: title.to_string(),
        search_text: search_text.to_string(),
        url: format!("https://shop.example/{}", title.to_lowercase().replace(' ', "-")),
        image_url: String::new(),
        category: category.to_string(),
        price: "10.00".to_string(),
        variants: String::new(),
        discount: 0,
    }
}

pub(crate) fn sample_catalog() -> ProductIndex {
    ProductIndex::new(vec![
        entry("iPhone 14", "Apple smartphone with A15 chip", "Phones"),
        entry("Garden Hose", "Flexible 20m hose for the yard", "Garden"),
        entry("Leather Wallet", "A classic gift for dad", "Accessories"),
        entry("Smart Watch", "Fitness tracker with heart-rate monitor", "Wearables"),
    ])
}

pub(crate) fn usd_snapshot(rates: &[(&str, f64)]) -> ExchangeRateSnapshot {
    ExchangeRateSnapshot {
        base: "USD".to_string(),
        rates: rates
            .iter()
            .map(|(code, rate)| (code.to_string(), *rate))
            .collect::<HashMap<_, _>>(),
        fetched_at: Utc::now(),
    }
}

/// Rate provider that replays scripted responses and counts calls.
pub(crate) struct ScriptedRateProvider {
    responses: Mutex<VecDeque<Result<ExchangeRateSnapshot>>>,
    fallback: Option<ExchangeRateSnapshot>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedRateProvider {
    pub(crate) fn new(responses: Vec<Result<ExchangeRateSnapshot>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            fallback: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn always(snapshot: ExchangeRateSnapshot) -> Self {
        Self {
            fallback: Some(snapshot),
            ..Self::new(Vec::new())
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateProvider for ScriptedRateProvider {
    async fn fetch_latest(&self) -> Result<ExchangeRateSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.responses.lock().unwrap().pop_front();
        match (scripted, &self.fallback) {
            (Some(response), _) => response,
            (None, Some(snapshot)) => Ok(snapshot.clone()),
            (None, None) => Err(OrchestrationError::RateFetch("script exhausted".to_string())),
        }
    }
}

/// Oracle stand-in with a fixed decision and synthesis reply. Records what
/// the synthesis phase was given.
pub(crate) struct ScriptedOracle {
    decision: std::result::Result<OracleReply, String>,
    synthesis: Option<String>,
    delay: Option<Duration>,
    decide_calls: AtomicUsize,
    synthesis_requests: Mutex<Vec<(String, ToolInvocation, serde_json::Value)>>,
}

impl ScriptedOracle {
    pub(crate) fn new(decision: OracleReply, synthesis: Option<String>) -> Self {
        Self {
            decision: Ok(decision),
            synthesis,
            delay: None,
            decide_calls: AtomicUsize::new(0),
            synthesis_requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            decision: Err(message.to_string()),
            ..Self::new(OracleReply::default(), None)
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn decide_calls(&self) -> usize {
        self.decide_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn synthesis_requests(&self) -> Vec<(String, ToolInvocation, serde_json::Value)> {
        self.synthesis_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn decide(&self, _request: &DecisionRequest<'_>) -> Result<OracleReply> {
        self.decide_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.decision
            .clone()
            .map_err(OrchestrationError::Oracle)
    }

    async fn synthesize(&self, request: &SynthesisRequest<'_>) -> Result<Option<String>> {
        self.synthesis_requests.lock().unwrap().push((
            request.query.to_string(),
            request.invocation.clone(),
            serde_json::to_value(request.result)?,
        ));

        Ok(self.synthesis.clone())
    }
}
